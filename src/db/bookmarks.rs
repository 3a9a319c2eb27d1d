//! Bookmarks database operations

use sqlx::{SqliteConnection, SqlitePool};

use crate::document::Bookmark;
use crate::error::Result;

/// Bookmark row as stored by the viewer
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookmarkRow {
    pub id: i64,
    pub document_path: String,
    #[sqlx(rename = "desc")]
    pub description: String,
    pub offset_y: f64,
}

impl From<BookmarkRow> for Bookmark {
    fn from(row: BookmarkRow) -> Self {
        Bookmark {
            description: row.description,
            y_offset: row.offset_y,
        }
    }
}

/// Bookmark queries against the shared store
pub struct BookmarkStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BookmarkStore<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List bookmarks of a document, oldest first
    pub async fn list_for_document(&self, hash: &str) -> Result<Vec<BookmarkRow>> {
        let rows = sqlx::query_as::<_, BookmarkRow>(
            r#"
            SELECT id, document_path, "desc", offset_y
            FROM bookmarks
            WHERE document_path = ?
            ORDER BY id ASC
            "#,
        )
        .bind(hash)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// Insert a bookmark on an open connection or transaction
pub async fn insert_bookmark(conn: &mut SqliteConnection, hash: &str, bookmark: &Bookmark) -> Result<()> {
    sqlx::query(r#"INSERT INTO bookmarks (document_path, "desc", offset_y) VALUES (?, ?, ?)"#)
        .bind(hash)
        .bind(&bookmark.description)
        .bind(bookmark.y_offset)
        .execute(conn)
        .await?;

    Ok(())
}

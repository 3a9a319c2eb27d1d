//! Highlights database operations

use sqlx::{SqliteConnection, SqlitePool};
use tracing::warn;

use crate::document::{AbsolutePosition, Highlight, HighlightType};
use crate::error::Result;

/// Highlight row as stored by the viewer
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HighlightRow {
    pub id: i64,
    pub document_path: String,
    #[sqlx(rename = "desc")]
    pub text: String,
    #[sqlx(rename = "type")]
    pub highlight_type: String,
    pub begin_x: f64,
    pub begin_y: f64,
    pub end_x: f64,
    pub end_y: f64,
}

impl From<HighlightRow> for Highlight {
    fn from(row: HighlightRow) -> Self {
        let highlight_type = row
            .highlight_type
            .chars()
            .next()
            .and_then(HighlightType::new)
            .unwrap_or_else(|| {
                warn!(id = row.id, value = %row.highlight_type, "Unknown highlight type, using default");
                HighlightType::default()
            });

        Highlight {
            text: row.text,
            highlight_type,
            selection_begin: AbsolutePosition::new(row.begin_x, row.begin_y),
            selection_end: AbsolutePosition::new(row.end_x, row.end_y),
        }
    }
}

/// Highlight queries against the shared store
pub struct HighlightStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> HighlightStore<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List highlights of a document, oldest first
    pub async fn list_for_document(&self, hash: &str) -> Result<Vec<HighlightRow>> {
        let rows = sqlx::query_as::<_, HighlightRow>(
            r#"
            SELECT id, document_path, "desc", "type", begin_x, begin_y, end_x, end_y
            FROM highlights
            WHERE document_path = ?
            ORDER BY id ASC
            "#,
        )
        .bind(hash)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Count highlights of a document
    pub async fn count_for_document(&self, hash: &str) -> Result<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM highlights WHERE document_path = ?")
            .bind(hash)
            .fetch_one(self.pool)
            .await?;

        Ok(result.0)
    }
}

/// Insert a highlight on an open connection or transaction
pub async fn insert_highlight(
    conn: &mut SqliteConnection,
    hash: &str,
    highlight: &Highlight,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO highlights (document_path, "desc", "type", begin_x, begin_y, end_x, end_y)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(hash)
    .bind(&highlight.text)
    .bind(highlight.highlight_type.to_string())
    .bind(highlight.selection_begin.offset_x)
    .bind(highlight.selection_begin.offset_y)
    .bind(highlight.selection_end.offset_x)
    .bind(highlight.selection_end.offset_y)
    .execute(conn)
    .await?;

    Ok(())
}

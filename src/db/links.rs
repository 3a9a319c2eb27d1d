//! Portal (link) database operations

use sqlx::{SqliteConnection, SqlitePool};

use crate::document::Portal;
use crate::error::Result;

/// Link row as stored by the viewer
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LinkRow {
    pub id: i64,
    pub src_document: String,
    pub dst_document: String,
    pub src_offset_y: f64,
    pub dst_offset_x: f64,
    pub dst_offset_y: f64,
    pub dst_zoom_level: f64,
}

impl From<LinkRow> for Portal {
    fn from(row: LinkRow) -> Self {
        Portal {
            src_document: row.src_document,
            dst_document: row.dst_document,
            src_offset_y: row.src_offset_y,
            dst_offset_x: row.dst_offset_x,
            dst_offset_y: row.dst_offset_y,
            dst_zoom_level: row.dst_zoom_level,
        }
    }
}

/// Link queries against the shared store
pub struct LinkStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LinkStore<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Links leaving a document, in source order
    pub async fn list_from(&self, hash: &str) -> Result<Vec<LinkRow>> {
        let rows = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, src_document, dst_document, src_offset_y,
                   dst_offset_x, dst_offset_y, dst_zoom_level
            FROM links
            WHERE src_document = ?
            ORDER BY src_offset_y ASC, id ASC
            "#,
        )
        .bind(hash)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// Delete every link leaving `hash`
pub async fn delete_links_from(conn: &mut SqliteConnection, hash: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM links WHERE src_document = ?")
        .bind(hash)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

/// Insert a link on an open connection or transaction
pub async fn insert_link(conn: &mut SqliteConnection, portal: &Portal) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO links (src_document, dst_document, src_offset_y,
                           dst_offset_x, dst_offset_y, dst_zoom_level)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&portal.src_document)
    .bind(&portal.dst_document)
    .bind(portal.src_offset_y)
    .bind(portal.dst_offset_x)
    .bind(portal.dst_offset_y)
    .bind(portal.dst_zoom_level)
    .execute(conn)
    .await?;

    Ok(())
}

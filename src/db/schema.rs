//! Database schema initialization
//!
//! The layout matches the viewer's own files so both can share them. Tables
//! are only created when missing; existing tables are never altered.

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the local store (path to hash mapping)
pub async fn initialize_local_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(LOCAL_SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

/// Initialize the shared store (highlights, bookmarks and links)
pub async fn initialize_shared_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SHARED_SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const LOCAL_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS document_hash (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT,
    hash TEXT
);
"#;

const SHARED_SCHEMA_SQL: &str = r#"
-- document_path holds the document's content hash, not a path
CREATE TABLE IF NOT EXISTS highlights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_path TEXT,
    "desc" TEXT,
    "type" CHAR,
    begin_x REAL,
    begin_y REAL,
    end_x REAL,
    end_y REAL
);

CREATE TABLE IF NOT EXISTS bookmarks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_path TEXT,
    "desc" TEXT,
    offset_y REAL
);

CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    src_document TEXT,
    dst_document TEXT,
    src_offset_y REAL,
    dst_offset_x REAL,
    dst_offset_y REAL,
    dst_zoom_level REAL
);
"#;

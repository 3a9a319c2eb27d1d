//! Database module for SQLite persistence
//!
//! Reads and writes the viewer's annotation stores: highlights, bookmarks and
//! links in the shared file, the path to hash table in the local one.

mod bookmarks;
mod document_hash;
mod highlights;
mod links;
mod repository;
mod schema;

pub use bookmarks::*;
pub use document_hash::*;
pub use highlights::*;
pub use links::*;
pub use repository::*;
pub use schema::*;

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::Result;

/// Create a connection pool for a database file
///
/// The file is created when missing. The journal mode is left as the viewer
/// configured it.
pub async fn create_pool(path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::debug!(path = %path.display(), "Database pool opened");
    Ok(pool)
}

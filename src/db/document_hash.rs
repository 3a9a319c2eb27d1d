//! Document path to content hash mapping
//!
//! The viewer keys annotations by a hash of the document's contents and keeps
//! the path to hash table in its local store. Paths are compared after
//! lexical normalization, so `a/./b.pdf`, `a//b.pdf` and `a\b.pdf` name the
//! same file.

use std::collections::HashMap;

use md5::{Digest, Md5};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentHashRow {
    pub id: i64,
    pub path: String,
    pub hash: String,
}

/// Content hash the viewer keys a document by: hex MD5 of the file
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Normalize a path without touching the filesystem
///
/// Backslashes become slashes, empty and `.` components are dropped and `..`
/// removes the component before it where there is one.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Load the whole table as normalized path to hash
///
/// When a path appears more than once the latest row wins.
pub async fn load_path_hashes(pool: &SqlitePool) -> Result<HashMap<String, String>> {
    let rows = sqlx::query_as::<_, DocumentHashRow>(
        "SELECT id, path, hash FROM document_hash ORDER BY id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (normalize_path(&row.path), row.hash))
        .collect())
}

/// Record the hash of a document path
pub async fn insert_document_hash(pool: &SqlitePool, path: &str, hash: &str) -> Result<()> {
    sqlx::query("INSERT INTO document_hash (path, hash) VALUES (?, ?)")
        .bind(path)
        .bind(hash)
        .execute(pool)
        .await?;

    Ok(())
}

/// Point `path` at `hash` on an open connection or transaction
///
/// Updates the row for the path when there is one and inserts otherwise.
pub async fn upsert_document_hash(conn: &mut SqliteConnection, path: &str, hash: &str) -> Result<()> {
    let updated = sqlx::query("UPDATE document_hash SET hash = ? WHERE path = ?")
        .bind(hash)
        .bind(path)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if updated == 0 {
        sqlx::query("INSERT INTO document_hash (path, hash) VALUES (?, ?)")
            .bind(path)
            .bind(hash)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/home/u/papers/a.pdf"), "/home/u/papers/a.pdf");
        assert_eq!(normalize_path("/home/u/./papers//a.pdf"), "/home/u/papers/a.pdf");
        assert_eq!(normalize_path("/home/u/tmp/../papers/a.pdf"), "/home/u/papers/a.pdf");
        assert_eq!(normalize_path("C:\\Users\\u\\a.pdf"), "C:/Users/u/a.pdf");
        assert_eq!(normalize_path("../a.pdf"), "../a.pdf");
        assert_eq!(normalize_path("/../a.pdf"), "/a.pdf");
        assert_eq!(normalize_path("./"), ".");
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(content_hash(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(content_hash(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }
}

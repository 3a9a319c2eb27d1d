//! Annotation repository
//!
//! The record store the sync passes read from and write to. Records and
//! links live in the viewer's shared store keyed by document hash; the local
//! store maps document paths to those hashes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::document::{Bookmark, Highlight, Portal};
use crate::error::Result;

use super::bookmarks::{insert_bookmark, BookmarkStore};
use super::document_hash::{
    insert_document_hash, load_path_hashes, normalize_path, upsert_document_hash,
};
use super::highlights::{insert_highlight, HighlightStore};
use super::links::{delete_links_from, insert_link, LinkStore};
use super::schema::{initialize_local_schema, initialize_shared_schema};

/// Trait for annotation record stores
#[async_trait::async_trait]
pub trait AnnotationRepository: Send + Sync {
    /// Highlights stored for a document hash
    async fn highlights_for(&self, hash: &str) -> Result<Vec<Highlight>>;

    /// Bookmarks stored for a document hash
    async fn bookmarks_for(&self, hash: &str) -> Result<Vec<Bookmark>>;

    /// Insert records in a single transaction; nothing is written on failure
    async fn insert_batch(
        &self,
        hash: &str,
        highlights: &[Highlight],
        bookmarks: &[Bookmark],
    ) -> Result<()>;

    /// Hash registered for a document path
    async fn hash_for_path(&self, path: &str) -> Result<Option<String>>;

    /// Register the hash of a document path
    async fn register_document(&self, path: &str, hash: &str) -> Result<()>;

    /// Links leaving a document hash
    async fn portals_from(&self, hash: &str) -> Result<Vec<Portal>>;

    /// Point `path` at `hash` and replace the links leaving `hash`
    ///
    /// Both stores are written in one transaction each; when either fails
    /// neither is changed.
    async fn register_extract(&self, path: &str, hash: &str, portals: &[Portal]) -> Result<()>;
}

#[async_trait::async_trait]
impl<T: AnnotationRepository + ?Sized> AnnotationRepository for Arc<T> {
    async fn highlights_for(&self, hash: &str) -> Result<Vec<Highlight>> {
        (**self).highlights_for(hash).await
    }

    async fn bookmarks_for(&self, hash: &str) -> Result<Vec<Bookmark>> {
        (**self).bookmarks_for(hash).await
    }

    async fn insert_batch(
        &self,
        hash: &str,
        highlights: &[Highlight],
        bookmarks: &[Bookmark],
    ) -> Result<()> {
        (**self).insert_batch(hash, highlights, bookmarks).await
    }

    async fn hash_for_path(&self, path: &str) -> Result<Option<String>> {
        (**self).hash_for_path(path).await
    }

    async fn register_document(&self, path: &str, hash: &str) -> Result<()> {
        (**self).register_document(path, hash).await
    }

    async fn portals_from(&self, hash: &str) -> Result<Vec<Portal>> {
        (**self).portals_from(hash).await
    }

    async fn register_extract(&self, path: &str, hash: &str, portals: &[Portal]) -> Result<()> {
        (**self).register_extract(path, hash, portals).await
    }
}

/// Repository over the viewer's local and shared SQLite stores
pub struct SqliteRepository {
    local: SqlitePool,
    shared: SqlitePool,
    /// Normalized path to hash, loaded on first lookup
    path_hashes: RwLock<Option<HashMap<String, String>>>,
}

impl SqliteRepository {
    /// Wrap existing pools and make sure the tables exist
    pub async fn new(local: SqlitePool, shared: SqlitePool) -> Result<Self> {
        initialize_local_schema(&local).await?;
        initialize_shared_schema(&shared).await?;

        Ok(Self {
            local,
            shared,
            path_hashes: RwLock::new(None),
        })
    }

    /// Open (or create) both store files
    pub async fn connect(local_path: &Path, shared_path: &Path) -> Result<Self> {
        let local = super::create_pool(local_path).await?;
        let shared = super::create_pool(shared_path).await?;
        Self::new(local, shared).await
    }

    pub fn shared_pool(&self) -> &SqlitePool {
        &self.shared
    }

    pub fn local_pool(&self) -> &SqlitePool {
        &self.local
    }
}

async fn insert_all(
    conn: &mut SqliteConnection,
    hash: &str,
    highlights: &[Highlight],
    bookmarks: &[Bookmark],
) -> Result<()> {
    for highlight in highlights {
        insert_highlight(conn, hash, highlight).await?;
    }
    for bookmark in bookmarks {
        insert_bookmark(conn, hash, bookmark).await?;
    }
    Ok(())
}

async fn write_extract(
    local: &mut SqliteConnection,
    shared: &mut SqliteConnection,
    path: &str,
    hash: &str,
    portals: &[Portal],
) -> Result<()> {
    upsert_document_hash(local, path, hash).await?;
    let replaced = delete_links_from(&mut *shared, hash).await?;
    for portal in portals {
        insert_link(&mut *shared, portal).await?;
    }
    debug!(hash = %hash, replaced, links = portals.len(), "Links written");
    Ok(())
}

#[async_trait::async_trait]
impl AnnotationRepository for SqliteRepository {
    async fn highlights_for(&self, hash: &str) -> Result<Vec<Highlight>> {
        let rows = HighlightStore::new(&self.shared).list_for_document(hash).await?;
        Ok(rows.into_iter().map(Highlight::from).collect())
    }

    async fn bookmarks_for(&self, hash: &str) -> Result<Vec<Bookmark>> {
        let rows = BookmarkStore::new(&self.shared).list_for_document(hash).await?;
        Ok(rows.into_iter().map(Bookmark::from).collect())
    }

    async fn insert_batch(
        &self,
        hash: &str,
        highlights: &[Highlight],
        bookmarks: &[Bookmark],
    ) -> Result<()> {
        if highlights.is_empty() && bookmarks.is_empty() {
            return Ok(());
        }

        let mut tx = self.shared.begin().await?;
        if let Err(e) = insert_all(&mut *tx, hash, highlights, bookmarks).await {
            warn!(hash = %hash, error = %e, "Batch insert failed, rolling back");
            tx.rollback().await?;
            return Err(e);
        }
        tx.commit().await?;

        debug!(
            hash = %hash,
            highlights = highlights.len(),
            bookmarks = bookmarks.len(),
            "Batch committed"
        );
        Ok(())
    }

    async fn hash_for_path(&self, path: &str) -> Result<Option<String>> {
        let key = normalize_path(path);

        {
            let cache = self.path_hashes.read().await;
            if let Some(map) = cache.as_ref() {
                return Ok(map.get(&key).cloned());
            }
        }

        let mut cache = self.path_hashes.write().await;
        if cache.is_none() {
            let map = load_path_hashes(&self.local).await?;
            debug!(entries = map.len(), "Document hash table loaded");
            *cache = Some(map);
        }
        Ok(cache.as_ref().and_then(|map| map.get(&key).cloned()))
    }

    async fn register_document(&self, path: &str, hash: &str) -> Result<()> {
        insert_document_hash(&self.local, path, hash).await?;

        let mut cache = self.path_hashes.write().await;
        if let Some(map) = cache.as_mut() {
            map.insert(normalize_path(path), hash.to_string());
        }
        Ok(())
    }

    async fn portals_from(&self, hash: &str) -> Result<Vec<Portal>> {
        let rows = LinkStore::new(&self.shared).list_from(hash).await?;
        Ok(rows.into_iter().map(Portal::from).collect())
    }

    async fn register_extract(&self, path: &str, hash: &str, portals: &[Portal]) -> Result<()> {
        let mut local = self.local.begin().await?;
        let mut shared = self.shared.begin().await?;

        if let Err(e) = write_extract(&mut *local, &mut *shared, path, hash, portals).await {
            warn!(path = %path, error = %e, "Extract registration failed, rolling back");
            shared.rollback().await?;
            local.rollback().await?;
            return Err(e);
        }
        local.commit().await?;
        shared.commit().await?;

        let mut cache = self.path_hashes.write().await;
        if let Some(map) = cache.as_mut() {
            map.insert(normalize_path(path), hash.to_string());
        }
        Ok(())
    }
}

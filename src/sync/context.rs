//! Per-document sync context

use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::db::AnnotationRepository;
use crate::document::{CacheStats, PageCache, PageGeometry, PdfPages};
use crate::error::{Result, SyncError};
use crate::selection::TextSelector;

use super::predicate::DedupPredicate;

/// Everything a sync pass needs for one open document
///
/// Owns the PDF, its page geometry and text cache, and the record store the
/// document's annotations live in. Dropping the context drops the cache.
pub struct SyncContext<P: PdfPages, R: AnnotationRepository> {
    pub(super) pdf: P,
    pub(super) geometry: PageGeometry,
    pub(super) cache: PageCache,
    pub(super) repository: R,
    pub(super) config: SyncConfig,
    pub(super) predicate: DedupPredicate,
    pub(super) hash: String,
}

impl<P: PdfPages, R: AnnotationRepository> SyncContext<P, R> {
    /// Create a context for a document whose hash is already known
    pub fn new(pdf: P, repository: R, hash: impl Into<String>, config: SyncConfig) -> Result<Self> {
        let geometry = PageGeometry::from_pdf(&pdf)?;
        let hash = hash.into();
        debug!(
            hash = %hash,
            pages = geometry.page_count(),
            total_height = geometry.total_height(),
            "Sync context created"
        );

        Ok(Self {
            pdf,
            geometry,
            cache: PageCache::new(config.page_cache),
            repository,
            predicate: DedupPredicate::new(config.proximity),
            config,
            hash,
        })
    }

    /// Create a context, looking the document hash up by path
    pub async fn for_path(pdf: P, repository: R, path: &str, config: SyncConfig) -> Result<Self> {
        let hash = repository
            .hash_for_path(path)
            .await?
            .ok_or_else(|| SyncError::UnknownDocument(path.to_string()))?;
        info!(path = %path, hash = %hash, "Document found");
        Self::new(pdf, repository, hash, config)
    }

    pub fn pdf(&self) -> &P {
        &self.pdf
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Give the PDF back, dropping the cache
    pub fn into_pdf(self) -> P {
        self.pdf
    }

    /// Text queries sharing this context's page cache
    pub fn selector(&mut self) -> TextSelector<'_, P> {
        TextSelector::new(&self.pdf, &mut self.cache)
    }
}

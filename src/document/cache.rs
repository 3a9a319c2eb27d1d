//! Per-document page text cache with LRU eviction
//!
//! Building the flattened text of a page means walking the whole text layer,
//! and both sync passes ask for the same pages over and over. Entries are
//! keyed by page index and live as long as the document they were built from.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::error::Result;
use super::types::PageText;

/// Default number of pages kept
pub const DEFAULT_PAGE_CAPACITY: usize = 64;

/// LRU cache of [`PageText`] keyed by page index
pub struct PageCache {
    pages: LruCache<usize, Arc<PageText>>,
    hits: u64,
    misses: u64,
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_CAPACITY)
    }
}

impl PageCache {
    /// Create a cache holding up to `capacity` pages; zero falls back to the default
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_PAGE_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);

        Self {
            pages: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Get a page, building it with `load` on a miss
    ///
    /// A failed load leaves the cache untouched.
    pub fn get_or_load<F>(&mut self, page: usize, load: F) -> Result<Arc<PageText>>
    where
        F: FnOnce() -> Result<PageText>,
    {
        if let Some(text) = self.pages.get(&page) {
            self.hits += 1;
            return Ok(Arc::clone(text));
        }

        self.misses += 1;
        let text = Arc::new(load()?);
        self.pages.put(page, Arc::clone(&text));
        Ok(text)
    }

    pub fn contains(&self, page: usize) -> bool {
        self.pages.contains(&page)
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            pages_used: self.pages.len(),
            pages_capacity: self.pages.cap().get(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached pages
    pub pages_used: usize,
    /// Page cache capacity
    pub pages_capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentError;

    fn page_with(text: &str) -> PageText {
        PageText {
            text: text.chars().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cache_creation() {
        let cache = PageCache::default();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().pages_capacity, DEFAULT_PAGE_CAPACITY);
    }

    #[test]
    fn test_zero_capacity_uses_default() {
        let cache = PageCache::new(0);
        assert_eq!(cache.stats().pages_capacity, DEFAULT_PAGE_CAPACITY);
    }

    #[test]
    fn test_loads_once() {
        let mut cache = PageCache::new(4);
        let mut loads = 0;

        for _ in 0..3 {
            let text = cache
                .get_or_load(2, || {
                    loads += 1;
                    Ok(page_with("hello"))
                })
                .unwrap();
            assert_eq!(text.text.len(), 5);
        }

        assert_eq!(loads, 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = PageCache::new(2);
        cache.get_or_load(0, || Ok(page_with("a"))).unwrap();
        cache.get_or_load(1, || Ok(page_with("b"))).unwrap();
        // touch page 0 so page 1 becomes the eviction candidate
        cache.get_or_load(0, || Ok(page_with("a"))).unwrap();
        cache.get_or_load(2, || Ok(page_with("c"))).unwrap();

        assert!(cache.contains(0));
        assert!(!cache.contains(1));
        assert!(cache.contains(2));
    }

    #[test]
    fn test_failed_load_not_cached() {
        let mut cache = PageCache::new(2);
        let result = cache.get_or_load(5, || Err(DocumentError::PageNotFound(5, 1)));
        assert!(result.is_err());
        assert!(!cache.contains(5));
    }
}

//! Deduplication predicate
//!
//! Decides whether a stored record and a PDF annotation describe the same
//! thing. There is no shared identifier between the two stores, so the
//! decision rests on vertical proximity on the page plus text similarity.

use crate::config::DEFAULT_PROXIMITY;
use crate::matching::fuzzy_equal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupPredicate {
    /// Largest vertical distance, exclusive, between record and annotation
    pub proximity: f64,
}

impl Default for DedupPredicate {
    fn default() -> Self {
        Self::new(DEFAULT_PROXIMITY)
    }
}

impl DedupPredicate {
    pub fn new(proximity: f64) -> Self {
        Self { proximity }
    }

    /// Whether two page-local vertical offsets are close enough
    pub fn is_near(&self, record_y: f64, annotation_y: f64) -> bool {
        (record_y - annotation_y).abs() < self.proximity
    }

    /// Highlight check, used in both directions
    ///
    /// `annotation_text` is the page text under the annotation rectangle.
    pub fn same_highlight(
        &self,
        record_y: f64,
        record_text: &str,
        annotation_y: f64,
        annotation_text: &str,
    ) -> bool {
        self.is_near(record_y, annotation_y) && fuzzy_equal(annotation_text, record_text)
    }

    /// Bookmark check when embedding: the note content must match exactly
    pub fn same_bookmark_exact(
        &self,
        record_y: f64,
        description: &str,
        annotation_y: f64,
        content: &str,
    ) -> bool {
        self.is_near(record_y, annotation_y) && content == description
    }

    /// Bookmark check when importing: the note content may differ slightly
    pub fn same_bookmark_fuzzy(
        &self,
        record_y: f64,
        description: &str,
        annotation_y: f64,
        content: &str,
    ) -> bool {
        self.is_near(record_y, annotation_y) && fuzzy_equal(content, description)
    }
}

//! Document traits
//!
//! The PDF capability the sync engine is written against.

use crate::geometry::{Point, Rect};

use super::error::Result;
use super::types::{AnnotationHandle, FreeTextOptions, NativeAnnotation, Rgb, Word};

/// Page-level access to a PDF: text geometry and native annotation objects
///
/// All coordinates are page-local with the origin at the top-left corner.
/// Mutations stay pending until [`PdfPages::save_incremental`] is called.
pub trait PdfPages {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Page `(width, height)` in points
    fn page_size(&self, page: usize) -> Result<(f64, f64)>;

    /// Words of the text layer in reading order
    fn words(&self, page: usize) -> Result<Vec<Word>>;

    /// Exact text search, one box per hit
    fn search_text(&self, page: usize, text: &str) -> Result<Vec<Rect>>;

    /// Highlight and note annotations on the page; other kinds are left out
    fn annotations(&self, page: usize) -> Result<Vec<NativeAnnotation>>;

    /// Add a highlight covering `quads`
    fn create_highlight(
        &mut self,
        page: usize,
        quads: &[Rect],
        stroke: Rgb,
        fill: Rgb,
    ) -> Result<AnnotationHandle>;

    /// Add a sticky note anchored at `at`
    fn create_text_note(&mut self, page: usize, at: Point, content: &str)
        -> Result<AnnotationHandle>;

    /// Add a free-text box
    fn create_free_text(
        &mut self,
        page: usize,
        rect: Rect,
        content: &str,
        options: &FreeTextOptions,
    ) -> Result<AnnotationHandle>;

    /// Remove an annotation from the page
    fn delete_annotation(&mut self, page: usize, handle: AnnotationHandle) -> Result<()>;

    /// Append pending changes to the file as an incremental update
    fn save_incremental(&mut self) -> Result<()>;
}

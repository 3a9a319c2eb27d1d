//! Document error types
//!
//! Errors raised while reading or writing a PDF and while mapping positions.

use thiserror::Error;

/// Document error type
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Document not found
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Page index outside the document
    #[error("Page {0} not found (document has {1} pages)")]
    PageNotFound(usize, usize),

    /// Absolute offset beyond the last page
    #[error("Offset {offset_y} is outside the document (total height {total_height})")]
    OutOfRange { offset_y: f64, total_height: f64 },

    /// Annotation handle unknown on the page
    #[error("Annotation {0} not found on page {1}")]
    AnnotationNotFound(u64, usize),

    /// Failed to parse document structure
    #[error("Parse error: {0}")]
    ParseError(String),

    /// MuPDF context error
    #[error("MuPDF context error: {0}")]
    ContextError(String),

    /// PDF object model error
    #[error("PDF object error: {0}")]
    ObjectError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Alias for Result
pub type DocumentResult<T> = Result<T>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::ContextError(err.to_string())
    }
}

impl From<lopdf::Error> for DocumentError {
    fn from(err: lopdf::Error) -> Self {
        DocumentError::ObjectError(err.to_string())
    }
}

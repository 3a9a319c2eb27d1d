//! Error types for marginalia

use thiserror::Error;

use crate::document::DocumentError;
use crate::geometry::GeometryError;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, SyncError>;

/// Sync error type
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("No document hash registered for {0}")]
    UnknownDocument(String),

    #[error("Text not found on page {page}: {text:?}")]
    NoMatchFound { page: usize, text: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Repository error: {0}")]
    Repository(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Whether the error only concerns a single record
    ///
    /// Passes that work record by record log these and move on. Damaged
    /// objects on one page count as well; a missing file, I/O and the record
    /// store do not.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            SyncError::NoMatchFound { .. }
                | SyncError::Geometry(_)
                | SyncError::Document(
                    DocumentError::OutOfRange { .. }
                        | DocumentError::PageNotFound(..)
                        | DocumentError::AnnotationNotFound(..)
                        | DocumentError::ParseError(_)
                        | DocumentError::ContextError(_)
                        | DocumentError::ObjectError(_)
                )
        )
    }
}

//! Document model
//!
//! Everything the sync engine knows about a PDF goes through this module:
//! the [`PdfPages`] capability, page geometry for mapping viewer positions,
//! and a page text cache.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 SyncContext                  │
//! └──────────────────────────────────────────────┘
//!         │                │               │
//!         ▼                ▼               ▼
//!  ┌──────────────┐ ┌──────────────┐ ┌───────────┐
//!  │ PageGeometry │ │  PageCache   │ │ PdfPages  │
//!  │ (positions)  │ │ (page text)  │ │  (trait)  │
//!  └──────────────┘ └──────────────┘ └───────────┘
//!                                      │       │
//!                                      ▼       ▼
//!                          MupdfDocument     MemoryPdf
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use marginalia::document::{AbsolutePosition, PageGeometry};
//! use marginalia::pdf::MupdfDocument;
//!
//! let pdf = MupdfDocument::open("paper.pdf")?;
//! let geometry = PageGeometry::from_pdf(&pdf)?;
//!
//! // Viewer offset to page-local position
//! let pos = geometry.to_document(AbsolutePosition::new(0.0, 850.0), true)?;
//! ```

mod cache;
mod error;
mod geometry;
mod traits;
mod types;

pub use cache::{CacheStats, PageCache, DEFAULT_PAGE_CAPACITY};
pub use error::{DocumentError, DocumentResult, Result};
pub use geometry::PageGeometry;
pub use traits::PdfPages;
pub use types::{
    AbsolutePosition, AnnotationHandle, Bookmark, DocumentPosition, FreeTextOptions, Highlight,
    HighlightType, NativeAnnotation, PageText, Portal, Rgb, Word,
};

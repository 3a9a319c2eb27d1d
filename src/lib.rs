//! marginalia
//!
//! Synchronizes the highlights and bookmarks a PDF viewer keeps in its own
//! SQLite files with annotations embedded in the PDF files.
//!
//! # Modules
//!
//! - `geometry`: Rectangle union, distances and line merging
//! - `matching`: Approximate text search and fuzzy equality
//! - `document`: Records, positions, page geometry and the PDF capability
//! - `pdf`: MuPDF/lopdf backed documents and an in-memory stand-in
//! - `selection`: Locating text on a page and selecting words by position
//! - `db`: The viewer's annotation stores
//! - `sync`: Embed and import passes, removal and free-text boxes

pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod geometry;
pub mod matching;
pub mod pdf;
pub mod selection;
pub mod sync;

pub use error::{Result, SyncError};

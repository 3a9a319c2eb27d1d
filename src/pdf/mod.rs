//! PDF implementations of [`PdfPages`](crate::document::PdfPages)
//!
//! - `MupdfDocument`: a PDF file, text through MuPDF and annotation objects
//!   through lopdf
//! - `MemoryPdf`: pages held in memory, used by tests and benchmarks
//!
//! [`crop_regions`] builds a separate PDF from regions of an existing one.

mod annots;
mod backend;
mod crop;
mod memory;
mod text;

pub use annots::{decode_text, PageBox, NOTE_ICON_SIZE};
pub use backend::MupdfDocument;
pub use crop::{crop_regions, CroppedPdf, CROP_MARGIN, SEPARATOR_HEIGHT};
pub use memory::{MemoryPdf, GLYPH_WIDTH, LEFT_MARGIN, LINE_HEIGHT, WORD_GAP};

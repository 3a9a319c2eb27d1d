//! Core document types
//!
//! Positions, annotation records, and the native PDF annotation model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

// ============================================================================
// Positions
// ============================================================================

/// A position relative to one page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentPosition {
    /// Page index (0-based)
    pub page: usize,
    pub offset_x: f64,
    /// Vertical offset from the top of `page`
    pub offset_y: f64,
}

impl DocumentPosition {
    pub fn new(page: usize, offset_x: f64, offset_y: f64) -> Self {
        Self {
            page,
            offset_x,
            offset_y,
        }
    }
}

/// A position on the continuous strip formed by stacking all pages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbsolutePosition {
    /// Horizontal offset, page-relative (unaffected by the page number)
    pub offset_x: f64,
    /// Vertical offset from the top of the first page
    pub offset_y: f64,
}

impl AbsolutePosition {
    pub fn new(offset_x: f64, offset_y: f64) -> Self {
        Self { offset_x, offset_y }
    }
}

// ============================================================================
// Viewer records
// ============================================================================

/// Highlight category, one lowercase ASCII letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct HighlightType(char);

impl HighlightType {
    pub fn new(symbol: char) -> Option<Self> {
        symbol.is_ascii_lowercase().then_some(Self(symbol))
    }

    pub fn symbol(&self) -> char {
        self.0
    }
}

impl Default for HighlightType {
    fn default() -> Self {
        Self('a')
    }
}

impl TryFrom<char> for HighlightType {
    type Error = String;

    fn try_from(symbol: char) -> Result<Self, Self::Error> {
        Self::new(symbol).ok_or_else(|| format!("Invalid highlight type: {:?}", symbol))
    }
}

impl From<HighlightType> for char {
    fn from(highlight_type: HighlightType) -> Self {
        highlight_type.0
    }
}

impl fmt::Display for HighlightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A highlight as the viewer stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub text: String,
    pub highlight_type: HighlightType,
    /// Begin of the selection; x is measured from the page center
    pub selection_begin: AbsolutePosition,
    /// End of the selection; x is measured from the page center
    pub selection_end: AbsolutePosition,
}

/// A bookmark as the viewer stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub description: String,
    /// Absolute vertical offset
    pub y_offset: f64,
}

/// A link from a spot in one document to a spot in another
///
/// The viewer calls these portals. Both ends are document hashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub src_document: String,
    pub dst_document: String,
    /// Absolute offset in the source document
    pub src_offset_y: f64,
    /// Destination x, measured from the page center
    pub dst_offset_x: f64,
    pub dst_offset_y: f64,
    pub dst_zoom_level: f64,
}

// ============================================================================
// PDF side
// ============================================================================

/// RGB color with components in `0..=1`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb(pub f64, pub f64, pub f64);

impl Rgb {
    /// Squared Euclidean distance between two colors
    pub fn distance_squared(&self, other: &Rgb) -> f64 {
        (self.0 - other.0).powi(2) + (self.1 - other.1).powi(2) + (self.2 - other.2).powi(2)
    }

    pub fn components(&self) -> [f64; 3] {
        [self.0, self.1, self.2]
    }
}

/// A word of the page text layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub rect: Rect,
    /// Layout block the word belongs to
    pub block: usize,
    /// Line inside the block
    pub line: usize,
}

impl Word {
    pub fn new(text: impl Into<String>, rect: Rect, block: usize, line: usize) -> Self {
        Self {
            text: text.into(),
            rect,
            block,
            line,
        }
    }
}

/// Opaque reference to an annotation object inside a PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationHandle(pub u64);

/// Native PDF annotation kinds the sync engine understands
#[derive(Debug, Clone, PartialEq)]
pub enum NativeAnnotation {
    /// `/Highlight` markup
    Highlight {
        handle: AnnotationHandle,
        rect: Rect,
        stroke_color: Option<Rgb>,
    },
    /// `/Text` sticky notes and `/FreeText` boxes
    FreeText {
        handle: AnnotationHandle,
        rect: Rect,
        content: String,
    },
    /// Any other subtype (`/Square`, `/Ink`, `/Underline`, ...)
    ///
    /// Never matched against records, only removed.
    Other {
        handle: AnnotationHandle,
        rect: Rect,
        subtype: String,
    },
}

impl NativeAnnotation {
    pub fn handle(&self) -> AnnotationHandle {
        match self {
            NativeAnnotation::Highlight { handle, .. }
            | NativeAnnotation::FreeText { handle, .. }
            | NativeAnnotation::Other { handle, .. } => *handle,
        }
    }

    /// Page-local rectangle
    pub fn rect(&self) -> Rect {
        match self {
            NativeAnnotation::Highlight { rect, .. }
            | NativeAnnotation::FreeText { rect, .. }
            | NativeAnnotation::Other { rect, .. } => *rect,
        }
    }
}

/// Styling for free-text annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeTextOptions {
    pub fontsize: f64,
    pub text_color: Rgb,
    pub fill_color: Option<Rgb>,
    pub border_color: Option<Rgb>,
}

impl Default for FreeTextOptions {
    fn default() -> Self {
        Self {
            fontsize: 11.0,
            text_color: Rgb(0.0, 0.0, 0.0),
            fill_color: None,
            border_color: None,
        }
    }
}

/// Page text flattened into one string with a box per character
#[derive(Debug, Clone, Default)]
pub struct PageText {
    /// Words in reading order
    pub words: Vec<Word>,
    /// Word texts, each followed by a space, or by a newline when the next
    /// word starts a new block
    pub text: Vec<char>,
    /// Box of the word each character of `text` came from
    pub char_rects: Vec<Rect>,
}

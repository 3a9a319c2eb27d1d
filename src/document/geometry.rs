//! Page geometry and coordinate mapping
//!
//! The viewer lays pages out top to bottom and records positions as one
//! vertical offset along that strip. `PageGeometry` converts between such
//! absolute offsets and page-local positions.
//!
//! ```text
//!  offset_y
//!     0 ┌────────┐ cumulative[0]
//!       │ page 0 │
//!   800 ├────────┤ cumulative[1]
//!       │ page 1 │
//!  1400 └────────┘ total height
//! ```

use super::error::{DocumentError, Result};
use super::traits::PdfPages;
use super::types::{AbsolutePosition, DocumentPosition};

/// Per-page sizes with a prefix sum of heights
///
/// Computed once when a document is opened and never changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    /// `(width, height)` per page
    sizes: Vec<(f64, f64)>,
    /// `cumulative[i]` is the height of all pages before page `i`; one extra
    /// trailing entry holds the total
    cumulative: Vec<f64>,
}

impl PageGeometry {
    /// Build from `(width, height)` pairs in page order
    pub fn new(sizes: Vec<(f64, f64)>) -> Self {
        let mut cumulative = Vec::with_capacity(sizes.len() + 1);
        let mut total = 0.0;
        cumulative.push(total);
        for (_, height) in &sizes {
            total += height;
            cumulative.push(total);
        }

        Self { sizes, cumulative }
    }

    /// Read page sizes from a PDF
    pub fn from_pdf<P: PdfPages + ?Sized>(pdf: &P) -> Result<Self> {
        let sizes = (0..pdf.page_count())
            .map(|page| pdf.page_size(page))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(sizes))
    }

    pub fn page_count(&self) -> usize {
        self.sizes.len()
    }

    pub fn total_height(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn page_width(&self, page: usize) -> Result<f64> {
        self.size(page).map(|(width, _)| width)
    }

    pub fn page_height(&self, page: usize) -> Result<f64> {
        self.size(page).map(|(_, height)| height)
    }

    /// Height of all pages before `page`
    pub fn cumulative_height(&self, page: usize) -> Result<f64> {
        self.size(page)?;
        Ok(self.cumulative[page])
    }

    fn size(&self, page: usize) -> Result<(f64, f64)> {
        self.sizes
            .get(page)
            .copied()
            .ok_or(DocumentError::PageNotFound(page, self.sizes.len()))
    }

    /// Page-local position to absolute position
    pub fn to_absolute(&self, pos: DocumentPosition) -> Result<AbsolutePosition> {
        let offset = self.cumulative_height(pos.page)?;
        Ok(AbsolutePosition::new(pos.offset_x, pos.offset_y + offset))
    }

    /// Page-local position to absolute position with x measured from the page center
    ///
    /// Inverse of [`PageGeometry::to_document`] with `centered_x` set.
    pub fn to_absolute_centered(&self, pos: DocumentPosition) -> Result<AbsolutePosition> {
        let half_width = self.page_width(pos.page)? / 2.0;
        let absolute = self.to_absolute(pos)?;
        Ok(AbsolutePosition::new(absolute.offset_x - half_width, absolute.offset_y))
    }

    /// Split an absolute vertical offset into `(page, local_y)`
    ///
    /// Each page owns the half-open band `[cumulative[page], cumulative[page + 1])`.
    pub fn absolute_to_page_local(&self, offset_y: f64) -> Result<(usize, f64)> {
        let total_height = self.total_height();
        if !offset_y.is_finite() || offset_y < 0.0 || offset_y >= total_height {
            return Err(DocumentError::OutOfRange {
                offset_y,
                total_height,
            });
        }

        // number of page ends at or above offset_y
        let page = self.cumulative[1..].partition_point(|&end| end <= offset_y);
        Ok((page, offset_y - self.cumulative[page]))
    }

    /// Absolute position to page-local position
    ///
    /// With `centered_x` the absolute x is taken to be measured from the page
    /// center, as the viewer stores it, and half the page width is added.
    pub fn to_document(&self, pos: AbsolutePosition, centered_x: bool) -> Result<DocumentPosition> {
        let (page, offset_y) = self.absolute_to_page_local(pos.offset_y)?;
        let offset_x = if centered_x {
            pos.offset_x + self.page_width(page)? / 2.0
        } else {
            pos.offset_x
        };
        Ok(DocumentPosition::new(page, offset_x, offset_y))
    }
}

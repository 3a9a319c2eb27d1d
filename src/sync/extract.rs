//! Extract pass: highlighted regions into a new PDF linked back to the source

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::{content_hash, AnnotationRepository};
use crate::document::{PdfPages, Portal};
use crate::error::{Result, SyncError};
use crate::geometry::Rect;
use crate::pdf::crop_regions;
use crate::selection::TextSelector;

use super::context::SyncContext;

/// Link destinations open at this fraction of the requested zoom level
const DESTINATION_ZOOM_FACTOR: f64 = 0.5;

/// Default location of the extract: `<stem>_highlights.pdf` beside `document`
pub fn extract_output_path(document: &Path) -> PathBuf {
    let stem = document
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .unwrap_or("document");
    document.with_file_name(format!("{}_highlights.pdf", stem))
}

/// Result of an extract pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractReport {
    pub output: PathBuf,
    /// Content hash of the written extract; `None` when nothing was written
    pub hash: Option<String>,
    /// Highlights copied into the extract
    pub regions: usize,
    /// Highlights spanning pages, covering no text or outside the document
    pub skipped: usize,
}

impl fmt::Display for ExtractReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hash {
            Some(_) => write!(
                f,
                "{} regions extracted to {}, {} skipped",
                self.regions,
                self.output.display(),
                self.skipped
            ),
            None => write!(f, "nothing extracted, {} skipped", self.skipped),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Region {
    page: usize,
    rect: Rect,
    /// Absolute offset the link back points at
    target_y: f64,
}

impl<P: PdfPages, R: AnnotationRepository> SyncContext<P, R> {
    /// Copy the region of every stored highlight into a new PDF at `output`
    ///
    /// `source` holds the bytes of this context's document. Regions are
    /// ordered by page and position. The extract's hash is registered for
    /// `output` and each region gets a link back to its highlight, replacing
    /// links an earlier extract with the same contents left behind.
    pub async fn extract(
        &mut self,
        source: &[u8],
        output: &Path,
        zoom_level: f64,
    ) -> Result<ExtractReport> {
        let highlights = self.repository.highlights_for(&self.hash).await?;

        let mut regions = Vec::with_capacity(highlights.len());
        let mut skipped = 0;
        let mut selector = TextSelector::new(&self.pdf, &mut self.cache);
        for highlight in &highlights {
            match selector.highlight_bounding_box(&self.geometry, highlight) {
                Ok(Some((page, rect))) => regions.push(Region {
                    page,
                    rect,
                    target_y: (highlight.selection_begin.offset_y
                        + highlight.selection_end.offset_y)
                        / 2.0,
                }),
                Ok(None) => {
                    debug!(text = %highlight.text, "Highlight spans pages or covers no text");
                    skipped += 1;
                }
                Err(e) => {
                    let e = SyncError::from(e);
                    if !e.is_record_level() {
                        return Err(e);
                    }
                    warn!(text = %highlight.text, error = %e, "Highlight not extracted");
                    skipped += 1;
                }
            }
        }

        let mut report = ExtractReport {
            output: output.to_path_buf(),
            hash: None,
            regions: regions.len(),
            skipped,
        };
        if regions.is_empty() {
            info!(hash = %self.hash, %report, "Extract pass finished");
            return Ok(report);
        }

        regions.sort_by(|a, b| a.page.cmp(&b.page).then(a.rect.y0.total_cmp(&b.rect.y0)));
        let crops: Vec<(usize, Rect)> = regions.iter().map(|r| (r.page, r.rect)).collect();
        let cropped = crop_regions(source, &crops)?;

        tokio::fs::write(output, &cropped.bytes).await?;
        let hash = content_hash(&cropped.bytes);

        let portals: Vec<Portal> = regions
            .iter()
            .zip(&cropped.offsets)
            .map(|(region, offset)| Portal {
                src_document: hash.clone(),
                dst_document: self.hash.clone(),
                src_offset_y: *offset,
                dst_offset_x: 0.0,
                dst_offset_y: region.target_y,
                dst_zoom_level: zoom_level * DESTINATION_ZOOM_FACTOR,
            })
            .collect();

        self.repository
            .register_extract(&output.to_string_lossy(), &hash, &portals)
            .await?;

        report.hash = Some(hash);
        info!(hash = %self.hash, %report, "Extract pass finished");
        Ok(report)
    }
}

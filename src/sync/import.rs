//! Import pass: PDF annotations into the record store

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::db::AnnotationRepository;
use crate::document::{Bookmark, DocumentPosition, Highlight, NativeAnnotation, PdfPages};
use crate::error::Result;
use crate::selection::TextSelector;

use super::color::nearest_type;
use super::context::SyncContext;
use super::types::SyncReport;

/// Stored records grouped by the page they start on, in page-local terms
#[derive(Default)]
struct PageRecords {
    /// `(local_y, text)` of highlight begins
    highlights: Vec<(f64, String)>,
    /// `(local_y, description)` of bookmarks
    bookmarks: Vec<(f64, String)>,
}

impl<P: PdfPages, R: AnnotationRepository> SyncContext<P, R> {
    /// Store every PDF highlight and note the record store lacks
    ///
    /// All new records are inserted in one transaction. When the insert
    /// fails nothing is stored and the error is returned.
    pub async fn import(&mut self) -> Result<SyncReport> {
        let stored = self.records_by_page().await?;
        let empty = PageRecords::default();

        let mut report = SyncReport::default();
        let mut new_highlights = Vec::new();
        let mut new_bookmarks = Vec::new();

        for page in 0..self.geometry.page_count() {
            let records = stored.get(&page).unwrap_or(&empty);
            let mut selector = TextSelector::new(&self.pdf, &mut self.cache);

            for annotation in self.pdf.annotations(page)? {
                match annotation {
                    NativeAnnotation::Highlight {
                        rect, stroke_color, ..
                    } => {
                        let text = selector.text_under_rect(page, &rect)?.replace('\n', "");
                        let known = records.highlights.iter().any(|(y, record_text)| {
                            self.predicate.same_highlight(*y, record_text, rect.y0, &text)
                        });
                        if known {
                            report.existing += 1;
                            continue;
                        }

                        let begin = self
                            .geometry
                            .to_absolute_centered(DocumentPosition::new(page, rect.x0, rect.y0))?;
                        let end = self
                            .geometry
                            .to_absolute_centered(DocumentPosition::new(page, rect.x1, rect.y1))?;
                        debug!(page, text = %text, "New highlight found");
                        new_highlights.push(Highlight {
                            text,
                            highlight_type: nearest_type(stroke_color),
                            selection_begin: begin,
                            selection_end: end,
                        });
                    }
                    NativeAnnotation::FreeText { rect, content, .. } => {
                        let known = records.bookmarks.iter().any(|(y, description)| {
                            self.predicate
                                .same_bookmark_fuzzy(*y, description, rect.y0, &content)
                        });
                        if known {
                            report.existing += 1;
                            continue;
                        }

                        let position = self
                            .geometry
                            .to_absolute(DocumentPosition::new(page, 0.0, rect.y0))?;
                        debug!(page, content = %content, "New bookmark found");
                        new_bookmarks.push(Bookmark {
                            description: content,
                            y_offset: position.offset_y,
                        });
                    }
                    NativeAnnotation::Other { .. } => {}
                }
            }
        }

        self.repository
            .insert_batch(&self.hash, &new_highlights, &new_bookmarks)
            .await?;
        report.created = new_highlights.len() + new_bookmarks.len();

        info!(hash = %self.hash, %report, "Import pass finished");
        Ok(report)
    }

    /// Load the document's records and place them on their pages
    ///
    /// Records whose position lies outside the document cannot match any
    /// annotation and are left out.
    async fn records_by_page(&self) -> Result<HashMap<usize, PageRecords>> {
        let mut pages: HashMap<usize, PageRecords> = HashMap::new();

        for highlight in self.repository.highlights_for(&self.hash).await? {
            match self.geometry.absolute_to_page_local(highlight.selection_begin.offset_y) {
                Ok((page, local_y)) => pages
                    .entry(page)
                    .or_default()
                    .highlights
                    .push((local_y, highlight.text)),
                Err(e) => warn!(error = %e, text = %highlight.text, "Stored highlight outside document"),
            }
        }

        for bookmark in self.repository.bookmarks_for(&self.hash).await? {
            match self.geometry.absolute_to_page_local(bookmark.y_offset) {
                Ok((page, local_y)) => pages
                    .entry(page)
                    .or_default()
                    .bookmarks
                    .push((local_y, bookmark.description)),
                Err(e) => {
                    warn!(error = %e, description = %bookmark.description, "Stored bookmark outside document")
                }
            }
        }

        Ok(pages)
    }
}

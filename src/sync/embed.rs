//! Embed pass: stored records into the PDF

use tracing::{debug, info};

use crate::config::EmbedMethod;
use crate::db::AnnotationRepository;
use crate::document::{Bookmark, Highlight, NativeAnnotation, PdfPages};
use crate::error::{Result, SyncError};
use crate::geometry::{self, Point, Rect};
use crate::selection::TextSelector;

use super::color::color_for;
use super::context::SyncContext;
use super::types::{RecordOutcome, SyncReport};

impl<P: PdfPages, R: AnnotationRepository> SyncContext<P, R> {
    /// Write every stored highlight and bookmark the PDF lacks into it
    ///
    /// Records are handled one at a time and a record that cannot be placed
    /// does not stop the pass. The PDF is saved once at the end, and only when
    /// an annotation was added.
    pub async fn embed(&mut self) -> Result<SyncReport> {
        let highlights = self.repository.highlights_for(&self.hash).await?;
        let bookmarks = self.repository.bookmarks_for(&self.hash).await?;
        debug!(
            hash = %self.hash,
            highlights = highlights.len(),
            bookmarks = bookmarks.len(),
            "Embedding stored annotations"
        );

        let mut report = SyncReport::default();
        for bookmark in &bookmarks {
            let outcome = self.embed_bookmark(bookmark);
            report.tally(outcome)?;
        }
        for highlight in &highlights {
            let outcome = self.embed_highlight(highlight);
            report.tally(outcome)?;
        }

        if report.created > 0 {
            self.pdf.save_incremental()?;
        }

        info!(hash = %self.hash, %report, "Embed pass finished");
        Ok(report)
    }

    /// Embed one highlight unless an equivalent annotation is on its page
    pub fn embed_highlight(&mut self, highlight: &Highlight) -> Result<RecordOutcome> {
        let begin = self.geometry.to_document(highlight.selection_begin, true)?;
        let page = begin.page;

        let mut selector = TextSelector::new(&self.pdf, &mut self.cache);
        for annotation in self.pdf.annotations(page)? {
            let NativeAnnotation::Highlight { rect, .. } = annotation else {
                continue;
            };
            if !self.predicate.is_near(begin.offset_y, rect.y0) {
                continue;
            }
            let existing_text = selector.text_under_rect(page, &rect)?;
            if self
                .predicate
                .same_highlight(begin.offset_y, &highlight.text, rect.y0, &existing_text)
            {
                debug!(page, text = %highlight.text, "Highlight already embedded");
                return Ok(RecordOutcome::Existing);
            }
        }

        let quads = match self.config.embed_method {
            EmbedMethod::Search => selector.best_selection_rects(page, &highlight.text, true)?,
            EmbedMethod::Words => {
                let end = self.geometry.to_document(highlight.selection_end, true)?;
                if end.page != page {
                    debug!(page, end_page = end.page, "Highlight spans pages");
                    None
                } else {
                    let words = selector.select_words_between(
                        page,
                        Point::new(begin.offset_x, begin.offset_y),
                        Point::new(end.offset_x, end.offset_y),
                    )?;
                    let rects: Vec<Rect> = words.iter().map(|word| word.rect).collect();
                    (!rects.is_empty()).then(|| geometry::merge_adjacent_on_line(&rects))
                }
            }
        };

        let quads = quads.ok_or_else(|| SyncError::NoMatchFound {
            page,
            text: highlight.text.clone(),
        })?;

        let color = color_for(highlight.highlight_type);
        let handle = self.pdf.create_highlight(page, &quads, color, color)?;
        debug!(page, handle = handle.0, quads = quads.len(), "Highlight embedded");
        Ok(RecordOutcome::Created)
    }

    /// Embed one bookmark as a sticky note unless its note is already there
    pub fn embed_bookmark(&mut self, bookmark: &Bookmark) -> Result<RecordOutcome> {
        let (page, local_y) = self.geometry.absolute_to_page_local(bookmark.y_offset)?;

        let already_there = self.pdf.annotations(page)?.iter().any(|annotation| match annotation {
            NativeAnnotation::FreeText { rect, content, .. } => {
                self.predicate
                    .same_bookmark_exact(local_y, &bookmark.description, rect.y0, content)
            }
            NativeAnnotation::Highlight { .. } | NativeAnnotation::Other { .. } => false,
        });
        if already_there {
            debug!(page, description = %bookmark.description, "Bookmark already embedded");
            return Ok(RecordOutcome::Existing);
        }

        let handle = self
            .pdf
            .create_text_note(page, Point::new(0.0, local_y), &bookmark.description)?;
        debug!(page, handle = handle.0, "Bookmark embedded");
        Ok(RecordOutcome::Created)
    }
}

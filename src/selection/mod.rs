//! Text selection engine
//!
//! Locates text on a page and turns it into rectangles, and goes the other
//! way from a pair of points to the words between them. Lookups first try
//! exact search and then relax the allowed edit distance one step at a time,
//! so the tightest match wins.

use std::sync::Arc;

use tracing::debug;

use crate::document::{
    Highlight, PageCache, PageGeometry, PageText, PdfPages, Result, Word,
};
use crate::geometry::{self, Point, Rect};
use crate::matching::find_approx_chars;

/// Number of tolerance levels tried, starting with exact search
pub const SELECTION_ATTEMPTS: usize = 10;

/// Flatten words into one string with a rectangle per character
///
/// Each word is followed by a space, or by a newline when the next word
/// belongs to another layout block. Separators take the rectangle of the word
/// they follow.
pub fn page_text_with_rect_map(words: Vec<Word>) -> PageText {
    let mut text = Vec::new();
    let mut char_rects = Vec::new();

    for (index, word) in words.iter().enumerate() {
        let separator = match words.get(index + 1) {
            Some(next) if next.block != word.block => '\n',
            _ => ' ',
        };
        for c in word.text.chars().chain(std::iter::once(separator)) {
            text.push(c);
            char_rects.push(word.rect);
        }
    }

    PageText {
        words,
        text,
        char_rects,
    }
}

/// Distinct rectangles in first-seen order
fn dedup_rects(rects: &[Rect]) -> Vec<Rect> {
    let mut unique: Vec<Rect> = Vec::new();
    for rect in rects {
        if !unique.contains(rect) {
            unique.push(*rect);
        }
    }
    unique
}

/// Text queries against one document
///
/// Borrows the PDF and the page cache of a sync context for the duration of
/// a lookup.
pub struct TextSelector<'a, P: PdfPages + ?Sized> {
    pdf: &'a P,
    cache: &'a mut PageCache,
}

impl<'a, P: PdfPages + ?Sized> TextSelector<'a, P> {
    pub fn new(pdf: &'a P, cache: &'a mut PageCache) -> Self {
        Self { pdf, cache }
    }

    /// Flattened page text, built on first use
    pub fn page_text(&mut self, page: usize) -> Result<Arc<PageText>> {
        let pdf = self.pdf;
        self.cache
            .get_or_load(page, || Ok(page_text_with_rect_map(pdf.words(page)?)))
    }

    /// Rectangles covering `text` with at most `max_errors` edits
    ///
    /// Exact lookups use the PDF's own search. Approximate hits map back to
    /// the rectangles of the words they touch.
    pub fn selection_rects(&mut self, page: usize, text: &str, max_errors: usize) -> Result<Vec<Rect>> {
        if max_errors == 0 {
            return self.pdf.search_text(page, text);
        }

        let page_text = self.page_text(page)?;
        let needle: Vec<char> = text.chars().collect();
        let rects = match find_approx_chars(&page_text.text, &needle, max_errors) {
            Some(span) => dedup_rects(&page_text.char_rects[span.start..span.end]),
            None => Vec::new(),
        };
        Ok(rects)
    }

    /// Rectangles of the closest match of `text`, or `None` when nothing matches
    ///
    /// With `merge`, approximate hits are collapsed into one box per line.
    pub fn best_selection_rects(
        &mut self,
        page: usize,
        text: &str,
        merge: bool,
    ) -> Result<Option<Vec<Rect>>> {
        if text.is_empty() {
            return Ok(None);
        }

        for max_errors in 0..SELECTION_ATTEMPTS {
            let rects = self.selection_rects(page, text, max_errors)?;
            if rects.is_empty() {
                continue;
            }

            debug!(page, max_errors, hits = rects.len(), "Text located");
            if merge && max_errors > 0 {
                return Ok(Some(geometry::merge_adjacent_on_line(&rects)));
            }
            return Ok(Some(rects));
        }

        Ok(None)
    }

    /// Top-left of the first and bottom-right of the last matching rectangle
    pub fn best_selection_span(&mut self, page: usize, text: &str) -> Result<Option<(Point, Point)>> {
        let span = self
            .best_selection_rects(page, text, false)?
            .and_then(|rects| match (rects.first(), rects.last()) {
                (Some(first), Some(last)) => Some((first.top_left(), last.bottom_right())),
                _ => None,
            });
        Ok(span)
    }

    /// Words from the one closest to `begin` through the one closest to `end`
    ///
    /// Both anchors are inclusive. Returns nothing when the end anchor comes
    /// before the begin anchor in reading order.
    pub fn select_words_between(&mut self, page: usize, begin: Point, end: Point) -> Result<Vec<Word>> {
        let page_text = self.page_text(page)?;
        let rects: Vec<Rect> = page_text.words.iter().map(|word| word.rect).collect();

        let (first, last) = match (
            geometry::closest_index(&rects, begin),
            geometry::closest_index(&rects, end),
        ) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(Vec::new()),
        };

        if last < first {
            debug!(page, first, last, "Selection anchors reversed");
            return Ok(Vec::new());
        }

        Ok(page_text.words[first..=last].to_vec())
    }

    /// Text of the words spanned by `rect`, separated by single spaces
    pub fn text_under_rect(&mut self, page: usize, rect: &Rect) -> Result<String> {
        let words = self.select_words_between(page, rect.top_left(), rect.bottom_right())?;
        Ok(words
            .iter()
            .map(|word| word.text.as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }

    /// Page and bounding box of the words a stored highlight covers
    ///
    /// `None` when the highlight starts and ends on different pages or covers
    /// no words.
    pub fn highlight_bounding_box(
        &mut self,
        geometry: &PageGeometry,
        highlight: &Highlight,
    ) -> Result<Option<(usize, Rect)>> {
        let begin = geometry.to_document(highlight.selection_begin, true)?;
        let end = geometry.to_document(highlight.selection_end, true)?;
        if begin.page != end.page {
            return Ok(None);
        }

        let words = self.select_words_between(
            begin.page,
            Point::new(begin.offset_x, begin.offset_y),
            Point::new(end.offset_x, end.offset_y),
        )?;
        let rects: Vec<Rect> = words.iter().map(|word| word.rect).collect();
        Ok(geometry::union(&rects).ok().map(|rect| (begin.page, rect)))
    }
}

//! In-memory PDF
//!
//! A [`PdfPages`] implementation without a file behind it. Pages carry
//! hand-placed words and an annotation list, which makes it the backend the
//! sync engine is tested against.

use crate::document::{
    AnnotationHandle, DocumentError, FreeTextOptions, NativeAnnotation, PdfPages, Result, Rgb, Word,
};
use crate::geometry::{self, Point, Rect};
use crate::selection::page_text_with_rect_map;

use super::annots::NOTE_ICON_SIZE;

/// Width of one character laid out by [`MemoryPdf::layout_line`]
pub const GLYPH_WIDTH: f64 = 6.0;
/// Gap between words laid out by [`MemoryPdf::layout_line`]
pub const WORD_GAP: f64 = 4.0;
/// Line height used by [`MemoryPdf::layout_line`]
pub const LINE_HEIGHT: f64 = 12.0;
/// Left margin used by [`MemoryPdf::layout_line`]
pub const LEFT_MARGIN: f64 = 50.0;

#[derive(Debug, Clone, Default)]
struct MemoryPage {
    width: f64,
    height: f64,
    words: Vec<Word>,
    annotations: Vec<NativeAnnotation>,
    /// Annotation reads fail as on a page with a damaged `/Annots`
    damaged: bool,
}

/// Pages, words and annotations held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryPdf {
    pages: Vec<MemoryPage>,
    next_handle: u64,
    saves: usize,
    free_text_options: Vec<(AnnotationHandle, FreeTextOptions)>,
}

impl MemoryPdf {
    /// Create empty pages of the given `(width, height)`
    pub fn new(sizes: Vec<(f64, f64)>) -> Self {
        Self {
            pages: sizes
                .into_iter()
                .map(|(width, height)| MemoryPage {
                    width,
                    height,
                    ..Default::default()
                })
                .collect(),
            next_handle: 1,
            ..Default::default()
        }
    }

    fn page(&self, page: usize) -> Result<&MemoryPage> {
        self.pages
            .get(page)
            .ok_or(DocumentError::PageNotFound(page, self.pages.len()))
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut MemoryPage> {
        let count = self.pages.len();
        self.pages
            .get_mut(page)
            .ok_or(DocumentError::PageNotFound(page, count))
    }

    fn next_handle(&mut self) -> AnnotationHandle {
        let handle = AnnotationHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Append a word to the text layer of `page`
    pub fn push_word(&mut self, page: usize, word: Word) -> Result<()> {
        self.page_mut(page)?.words.push(word);
        Ok(())
    }

    /// Lay `text` out as one line of monospaced words with its top edge at `y`
    ///
    /// Returns the rectangles of the words placed.
    pub fn layout_line(&mut self, page: usize, block: usize, y: f64, text: &str) -> Vec<Rect> {
        let Ok(target) = self.page_mut(page) else {
            return Vec::new();
        };
        let line = target
            .words
            .iter()
            .filter(|w| w.block == block)
            .map(|w| w.line + 1)
            .max()
            .unwrap_or(0);

        let mut x = LEFT_MARGIN;
        let mut rects = Vec::new();
        for token in text.split_whitespace() {
            let width = token.chars().count() as f64 * GLYPH_WIDTH;
            let rect = Rect::new(x, y, x + width, y + LINE_HEIGHT);
            target.words.push(Word::new(token, rect, block, line));
            rects.push(rect);
            x += width + WORD_GAP;
        }
        rects
    }

    /// Place an annotation as if another PDF tool had created it
    pub fn insert_annotation(&mut self, page: usize, annotation: NativeAnnotation) -> Result<()> {
        self.next_handle = self.next_handle.max(annotation.handle().0 + 1);
        self.page_mut(page)?.annotations.push(annotation);
        Ok(())
    }

    /// Make reading `page`'s annotations fail with an object error
    pub fn damage_annotations(&mut self, page: usize) -> Result<()> {
        self.page_mut(page)?.damaged = true;
        Ok(())
    }

    /// Number of incremental saves so far
    pub fn save_count(&self) -> usize {
        self.saves
    }

    /// Styling a free-text annotation was created with
    pub fn free_text_options(&self, handle: AnnotationHandle) -> Option<&FreeTextOptions> {
        self.free_text_options
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, options)| options)
    }
}

impl PdfPages for MemoryPdf {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let page = self.page(page)?;
        Ok((page.width, page.height))
    }

    fn words(&self, page: usize) -> Result<Vec<Word>> {
        Ok(self.page(page)?.words.clone())
    }

    /// Case-sensitive exact search, one rectangle per line of each hit
    fn search_text(&self, page: usize, text: &str) -> Result<Vec<Rect>> {
        let page_text = page_text_with_rect_map(self.page(page)?.words.clone());
        let needle: Vec<char> = text.chars().collect();
        if needle.is_empty() || needle.len() > page_text.text.len() {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        for start in 0..=(page_text.text.len() - needle.len()) {
            if page_text.text[start..start + needle.len()] != needle[..] {
                continue;
            }
            let mut covered: Vec<Rect> = Vec::new();
            for rect in &page_text.char_rects[start..start + needle.len()] {
                if covered.last() != Some(rect) {
                    covered.push(*rect);
                }
            }
            hits.extend(geometry::merge_adjacent_on_line(&covered));
        }
        Ok(hits)
    }

    fn annotations(&self, page: usize) -> Result<Vec<NativeAnnotation>> {
        let target = self.page(page)?;
        if target.damaged {
            return Err(DocumentError::ObjectError(format!(
                "Dangling /Annots reference on page {}",
                page
            )));
        }
        Ok(target.annotations.clone())
    }

    fn create_highlight(
        &mut self,
        page: usize,
        quads: &[Rect],
        stroke: Rgb,
        _fill: Rgb,
    ) -> Result<AnnotationHandle> {
        let rect = geometry::union(quads)
            .map_err(|e| DocumentError::ObjectError(e.to_string()))?;
        self.page(page)?;
        let handle = self.next_handle();
        self.page_mut(page)?.annotations.push(NativeAnnotation::Highlight {
            handle,
            rect,
            stroke_color: Some(stroke),
        });
        Ok(handle)
    }

    fn create_text_note(&mut self, page: usize, at: Point, content: &str) -> Result<AnnotationHandle> {
        self.page(page)?;
        let handle = self.next_handle();
        self.page_mut(page)?.annotations.push(NativeAnnotation::FreeText {
            handle,
            rect: Rect::new(at.x, at.y, at.x + NOTE_ICON_SIZE, at.y + NOTE_ICON_SIZE),
            content: content.to_string(),
        });
        Ok(handle)
    }

    fn create_free_text(
        &mut self,
        page: usize,
        rect: Rect,
        content: &str,
        options: &FreeTextOptions,
    ) -> Result<AnnotationHandle> {
        self.page(page)?;
        let handle = self.next_handle();
        self.page_mut(page)?.annotations.push(NativeAnnotation::FreeText {
            handle,
            rect,
            content: content.to_string(),
        });
        self.free_text_options.push((handle, options.clone()));
        Ok(handle)
    }

    fn delete_annotation(&mut self, page: usize, handle: AnnotationHandle) -> Result<()> {
        let annotations = &mut self.page_mut(page)?.annotations;
        let before = annotations.len();
        annotations.retain(|annot| annot.handle() != handle);
        if annotations.len() == before {
            return Err(DocumentError::AnnotationNotFound(handle.0, page));
        }
        Ok(())
    }

    fn save_incremental(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }
}

//! Structured text helpers
//!
//! Turns MuPDF's block/line/char text layer into words with page-local
//! rectangles, and search hits into rectangles.

use mupdf::{Page, Quad, TextPageOptions};

use crate::document::{Result, Word};
use crate::geometry::Rect;

/// Upper bound on hits collected per search
pub const MAX_SEARCH_HITS: u32 = 500;

/// Bounding rectangle of a MuPDF quad
pub fn quad_to_rect(quad: &Quad) -> Rect {
    let x0 = quad.ul.x.min(quad.ll.x);
    let y0 = quad.ul.y.min(quad.ur.y);
    let x1 = quad.ur.x.max(quad.lr.x);
    let y1 = quad.ll.y.max(quad.lr.y);
    Rect::new(x0 as f64, y0 as f64, x1 as f64, y1 as f64)
}

/// Words grouped from characters, split on whitespace and line ends
///
/// Words keep the index of the block and of the line inside the block they
/// came from, so callers can tell paragraph breaks from line wraps.
pub fn extract_words(page: &Page) -> Result<Vec<Word>> {
    let text_page = page.to_text_page(TextPageOptions::empty())?;
    let mut words = Vec::new();

    for (block_index, block) in text_page.blocks().enumerate() {
        for (line_index, line) in block.lines().enumerate() {
            let mut current: Option<(String, Rect)> = None;

            for ch in line.chars() {
                let Some(c) = ch.char() else {
                    continue;
                };

                if c.is_whitespace() {
                    if let Some((text, rect)) = current.take() {
                        words.push(Word::new(text, rect, block_index, line_index));
                    }
                    continue;
                }

                let char_rect = quad_to_rect(&ch.quad());
                match current.as_mut() {
                    Some((text, rect)) => {
                        text.push(c);
                        *rect = rect.include(&char_rect);
                    }
                    None => current = Some((c.to_string(), char_rect)),
                }
            }

            if let Some((text, rect)) = current.take() {
                words.push(Word::new(text, rect, block_index, line_index));
            }
        }
    }

    Ok(words)
}

/// Search for text in a page, one rectangle per hit and line
pub fn search_text(page: &Page, query: &str) -> Result<Vec<Rect>> {
    let quads = page.search(query, MAX_SEARCH_HITS)?;
    Ok(quads.into_iter().map(|quad| quad_to_rect(&quad)).collect())
}

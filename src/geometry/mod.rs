//! Rectangle geometry
//!
//! Helpers that turn per-character and per-word boxes reported by the PDF
//! text layer into annotation-sized regions.

mod rect;

pub use rect::{Point, Rect};

use thiserror::Error;

/// Geometry contract violations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// An operation that needs at least one rectangle received none
    #[error("Empty rectangle set passed to {0}")]
    EmptyInput(&'static str),
}

/// Share of the running line height two boxes may be offset by and still sit on one line
const LINE_MERGE_TOLERANCE: f64 = 0.3;

/// Bounding box of a non-empty set of rectangles
pub fn union(rects: &[Rect]) -> Result<Rect, GeometryError> {
    let (first, rest) = rects.split_first().ok_or(GeometryError::EmptyInput("union"))?;
    Ok(rest.iter().fold(*first, |acc, rect| acc.include(rect)))
}

/// The rectangle nearest to `point`
///
/// Ties go to the rectangle that comes first.
pub fn closest_to(rects: &[Rect], point: Point) -> Result<Rect, GeometryError> {
    closest_index(rects, point)
        .map(|index| rects[index])
        .ok_or(GeometryError::EmptyInput("closest_to"))
}

/// Index of the rectangle nearest to `point`, `None` for an empty slice
pub fn closest_index(rects: &[Rect], point: Point) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, rect) in rects.iter().enumerate() {
        let distance = rect.distance_to(point);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

/// Collapse consecutive boxes sharing a text line into one box per line
///
/// A box joins the current run when its top edge is within 30% of the run's
/// height from the run's top edge. Inside a run the right edge grows to the
/// furthest one seen while both the top and the bottom edge take the minimum.
pub fn merge_adjacent_on_line(rects: &[Rect]) -> Vec<Rect> {
    let mut merged: Vec<Rect> = Vec::new();

    for rect in rects {
        match merged.last_mut() {
            Some(run) if (rect.y0 - run.y0).abs() < run.height().abs() * LINE_MERGE_TOLERANCE => {
                run.x1 = run.x1.max(rect.x1);
                run.y0 = run.y0.min(rect.y0);
                run.y1 = run.y1.min(rect.y1);
            }
            _ => merged.push(*rect),
        }
    }

    merged
}

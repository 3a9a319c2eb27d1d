//! Highlight type colors
//!
//! The viewer shows each highlight type in a fixed color. Embedding uses the
//! color of the type; importing goes the other way and picks the type whose
//! color is closest to the annotation's stroke.

use crate::document::{HighlightType, Rgb};

/// Color of every highlight type, in letter order
pub const COLOR_MAP: [(char, Rgb); 26] = [
    ('a', Rgb(0.94, 0.64, 1.00)),
    ('b', Rgb(0.00, 0.46, 0.86)),
    ('c', Rgb(0.60, 0.25, 0.00)),
    ('d', Rgb(0.30, 0.00, 0.36)),
    ('e', Rgb(0.10, 0.10, 0.10)),
    ('f', Rgb(0.00, 0.36, 0.19)),
    ('g', Rgb(0.17, 0.81, 0.28)),
    ('h', Rgb(1.00, 0.80, 0.60)),
    ('i', Rgb(0.50, 0.50, 0.50)),
    ('j', Rgb(0.58, 1.00, 0.71)),
    ('k', Rgb(0.56, 0.49, 0.00)),
    ('l', Rgb(0.62, 0.80, 0.00)),
    ('m', Rgb(0.76, 0.00, 0.53)),
    ('n', Rgb(0.00, 0.20, 0.50)),
    ('o', Rgb(1.00, 0.64, 0.02)),
    ('p', Rgb(1.00, 0.66, 0.73)),
    ('q', Rgb(0.26, 0.40, 0.00)),
    ('r', Rgb(1.00, 0.00, 0.06)),
    ('s', Rgb(0.37, 0.95, 0.95)),
    ('t', Rgb(0.00, 0.60, 0.56)),
    ('u', Rgb(0.88, 1.00, 0.40)),
    ('v', Rgb(0.45, 0.04, 1.00)),
    ('w', Rgb(0.60, 0.00, 0.00)),
    ('x', Rgb(1.00, 1.00, 0.50)),
    ('y', Rgb(1.00, 1.00, 0.00)),
    ('z', Rgb(1.00, 0.31, 0.02)),
];

/// Embedding color of a highlight type
pub fn color_for(highlight_type: HighlightType) -> Rgb {
    let index = (highlight_type.symbol() as usize).saturating_sub('a' as usize);
    COLOR_MAP
        .get(index)
        .map(|(_, color)| *color)
        .unwrap_or(COLOR_MAP[0].1)
}

/// Highlight type with the color nearest to `color`
///
/// Distance is squared Euclidean in RGB. On a tie the earlier letter wins.
/// Annotations without a color map to the default type.
pub fn nearest_type(color: Option<Rgb>) -> HighlightType {
    let Some(color) = color else {
        return HighlightType::default();
    };

    let mut best = COLOR_MAP[0];
    let mut best_distance = color.distance_squared(&best.1);
    for entry in &COLOR_MAP[1..] {
        let distance = color.distance_squared(&entry.1);
        if distance < best_distance {
            best = *entry;
            best_distance = distance;
        }
    }

    HighlightType::new(best.0).unwrap_or_default()
}

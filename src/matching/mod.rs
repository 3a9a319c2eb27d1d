//! Approximate text matching
//!
//! - `approx`: bounded edit-distance substring search
//! - `fuzzy`: the "same annotation text" heuristic used for deduplication

mod approx;
mod fuzzy;

pub use approx::{find_approx, find_approx_chars, Span};
pub use fuzzy::fuzzy_equal;

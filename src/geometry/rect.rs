//! Rectangle and point primitives
//!
//! Page-local coordinates with the origin at the top-left corner of the page
//! and y growing downwards (the convention MuPDF reports text in).

use serde::{Deserialize, Serialize};

/// A point on a page
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned rectangle given by its corners
///
/// `(x0, y0)` is the top-left corner and `(x1, y1)` the bottom-right one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// The degenerate rectangle at the origin
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x0, self.y0)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x0 + self.width() / 2.0, self.y0 + self.height() / 2.0)
    }

    /// Whether the point lies inside the rectangle (edges included)
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x0 && point.x <= self.x1 && point.y >= self.y0 && point.y <= self.y1
    }

    /// Whether the two rectangles share a region of positive area
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Distance from a point: zero inside, distance to the center otherwise
    pub fn distance_to(&self, point: Point) -> f64 {
        if self.contains(point) {
            0.0
        } else {
            self.center().distance(point)
        }
    }

    /// Smallest rectangle covering both
    pub fn include(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Corner points in PDF quad order: upper-left, upper-right, lower-left, lower-right
    pub fn quad_points(&self) -> [Point; 4] {
        [
            Point::new(self.x0, self.y0),
            Point::new(self.x1, self.y0),
            Point::new(self.x0, self.y1),
            Point::new(self.x1, self.y1),
        ]
    }
}

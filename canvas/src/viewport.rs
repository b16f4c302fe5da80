#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

/// A point in either client or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Axis-aligned rectangle stored as its top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle of the given size centred on the origin.
    #[must_use]
    pub fn centered(width: f64, height: f64) -> Self {
        Self { x: -width / 2.0, y: -height / 2.0, width, height }
    }

    /// Normalized rectangle spanning two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self { x: left, y: top, width: (a.x - b.x).abs(), height: (a.y - b.y).abs() }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether `p` lies strictly inside; points on an edge are outside.
    #[must_use]
    pub fn contains_strict(&self, p: Point) -> bool {
        p.x > self.x && p.x < self.right() && p.y > self.y && p.y < self.bottom()
    }
}

/// Layout of the canvas element on screen, captured by the host from the
/// live rendering surface.
///
/// `origin_*` is the on-screen position of the surface's top-left corner,
/// `chrome_offset_x` the width of UI chrome (the side toolbar) that overlaps
/// the surface on the left, `displayed_*` the on-screen size, and `canvas_*`
/// the surface's pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub origin_x: f64,
    pub origin_y: f64,
    pub chrome_offset_x: f64,
    pub displayed_width: f64,
    pub displayed_height: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl ViewportMetrics {
    /// Metrics for a surface shown at its native size with no offset, so
    /// client coordinates equal canvas coordinates.
    #[must_use]
    pub fn identity(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            chrome_offset_x: 0.0,
            displayed_width: canvas_width,
            displayed_height: canvas_height,
            canvas_width,
            canvas_height,
        }
    }

    /// Horizontal canvas pixels per displayed pixel.
    #[must_use]
    pub fn scale_x(&self) -> f64 {
        ratio(self.canvas_width, self.displayed_width)
    }

    /// Vertical canvas pixels per displayed pixel.
    #[must_use]
    pub fn scale_y(&self) -> f64 {
        ratio(self.canvas_height, self.displayed_height)
    }

    /// Convert a client-space pointer position into canvas pixels.
    #[must_use]
    pub fn to_canvas(&self, client: Point) -> Point {
        Point {
            x: (client.x - self.origin_x - self.chrome_offset_x) * self.scale_x(),
            y: (client.y - self.origin_y) * self.scale_y(),
        }
    }

    /// Convert a canvas-space point back into client coordinates.
    #[must_use]
    pub fn to_client(&self, canvas: Point) -> Point {
        Point {
            x: canvas.x / self.scale_x() + self.origin_x + self.chrome_offset_x,
            y: canvas.y / self.scale_y() + self.origin_y,
        }
    }
}

fn ratio(canvas: f64, displayed: f64) -> f64 {
    if displayed > 0.0 && canvas > 0.0 { canvas / displayed } else { 1.0 }
}

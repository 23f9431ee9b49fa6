use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Drawable area as reported by the presentation layer, in its own
/// coordinate space (logical units, scale factor already removed).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGeometry {
    pub width: f32,
    pub height: f32,
    pub target_radius: f32,
}

/// Origin and extent of the range a target centre may be drawn from on one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f32,
    pub span: f32,
}

impl SurfaceGeometry {
    pub fn new(width: f32, height: f32, target_radius: f32) -> Self {
        Self {
            width,
            height,
            target_radius,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Usable range for target centres: the surface minus radius and padding
    /// on each side. The span is always finite and at least one unit, so
    /// degenerate surfaces still yield a non-empty range.
    pub fn placement(&self, padding: f32) -> (AxisRange, AxisRange) {
        (
            axis_range(self.width, self.target_radius, padding),
            axis_range(self.height, self.target_radius, padding),
        )
    }

    /// True when the surface cannot fit a padded target on some axis.
    pub fn is_degenerate(&self, padding: f32) -> bool {
        let needed = 2.0 * (self.target_radius + padding) + 1.0;
        !(self.width >= needed && self.height >= needed)
    }
}

fn axis_range(extent: f32, radius: f32, padding: f32) -> AxisRange {
    let min = radius + padding;
    let max = extent - radius - padding;
    let span = max - min;
    AxisRange {
        min,
        span: if span.is_finite() { span.max(1.0) } else { 1.0 },
    }
}

/// Circular hit region test. Non-finite input never hits.
pub fn within_radius(center: Point, radius: f32, at: Point) -> bool {
    at.distance_sq(center) <= radius * radius
}

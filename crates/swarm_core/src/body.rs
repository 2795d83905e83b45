//! # Hit-Test Body
//!
//! A union of circles and axis-aligned rectangles, defined in the sprite's
//! local frame: origin at the sprite centre, unrotated. The owning sprite
//! keeps the body's world placement in sync on every move and rotate.
//!
//! ```text
//!   world point ──(- position)──(rotate by -angle)──► local point
//!                                                       │
//!                         radius-of-caring reject ◄─────┤
//!                         circles, then rectangles ◄────┘
//! ```

use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Circle {
    x: f64,
    y: f64,
    radius: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Rectangle {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

/// Composite shape used for click detection.
///
/// `Clone` deep-copies the shape lists, so a cloned sprite's body can be
/// extended independently of the original.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Body {
    /// Farthest distance from the local origin any sub-shape reaches.
    radius_of_caring: f64,
    circles: Vec<Circle>,
    rectangles: Vec<Rectangle>,
    x: f64,
    y: f64,
    angle: f64,
}

impl Body {
    /// Creates an empty body. It contains no points until shapes are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a circle centred at `(cx, cy)` in local coordinates.
    pub fn add_circle(&mut self, cx: f64, cy: f64, radius: f64) {
        self.circles.push(Circle { x: cx, y: cy, radius });
        self.radius_of_caring = self.radius_of_caring.max(cx.hypot(cy) + radius);
    }

    /// Adds the open rectangle `x1 < x < x2, y1 < y < y2`.
    ///
    /// Requires `x1 < x2` and `y1 < y2`; anything else is logged and
    /// ignored.
    pub fn add_rectangle(&mut self, x1: f64, x2: f64, y1: f64, y2: f64) {
        // Negated so NaN bounds are rejected too.
        if !(x1 < x2 && y1 < y2) {
            warn!(x1, x2, y1, y2, "rectangle needs x1 < x2 and y1 < y2, ignored");
            return;
        }
        self.rectangles.push(Rectangle { x1, x2, y1, y2 });
        for (cx, cy) in [(x1, y1), (x1, y2), (x2, y1), (x2, y2)] {
            self.radius_of_caring = self.radius_of_caring.max(cx.hypot(cy));
        }
    }

    /// Sets the world position of the local origin.
    #[inline]
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Sets the world rotation in radians, counter-clockwise.
    #[inline]
    pub fn set_angle(&mut self, radians: f64) {
        self.angle = radians;
    }

    /// Current world position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Current world rotation in radians.
    #[inline]
    #[must_use]
    pub const fn angle(&self) -> f64 {
        self.angle
    }

    /// Cached bound used for early rejection.
    #[inline]
    #[must_use]
    pub const fn radius_of_caring(&self) -> f64 {
        self.radius_of_caring
    }

    /// Whether the body has no sub-shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.circles.is_empty() && self.rectangles.is_empty()
    }

    /// Maps a world point into the body's local, unrotated frame.
    #[must_use]
    pub fn to_local(&self, world_x: f64, world_y: f64) -> (f64, f64) {
        let x = world_x - self.x;
        let y = world_y - self.y;
        if self.angle == 0.0 {
            return (x, y);
        }
        let (sin, cos) = (-self.angle).sin_cos();
        (cos * x - sin * y, sin * x + cos * y)
    }

    /// Whether a world point lies inside any sub-shape.
    #[must_use]
    pub fn contains(&self, world_x: f64, world_y: f64) -> bool {
        let (x, y) = self.to_local(world_x, world_y);

        if x * x + y * y >= self.radius_of_caring * self.radius_of_caring {
            return false;
        }

        let in_circle = self.circles.iter().any(|c| {
            let dx = c.x - x;
            let dy = c.y - y;
            dx * dx + dy * dy < c.radius * c.radius
        });

        in_circle
            || self
                .rectangles
                .iter()
                .any(|r| x > r.x1 && x < r.x2 && y > r.y1 && y < r.y2)
    }
}

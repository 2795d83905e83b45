//! 2D math used when placing costumes on screen.

use serde::{Deserialize, Serialize};

/// Converts degrees to radians.
#[inline]
#[must_use]
pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

/// Converts radians to degrees.
#[inline]
#[must_use]
pub fn radians_to_degrees(radians: f64) -> f64 {
    radians.to_degrees()
}

/// 2D affine transform.
///
/// Maps `(x, y)` to `(a*x + c*y + tx, b*x + d*y + ty)`. Builder methods
/// append a step, so `Affine2::IDENTITY.translate(..).rotate(..)` first
/// translates and then rotates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affine2 {
    /// X scale / rotation component.
    pub a: f64,
    /// Y shear / rotation component.
    pub b: f64,
    /// X shear / rotation component.
    pub c: f64,
    /// Y scale / rotation component.
    pub d: f64,
    /// X translation.
    pub tx: f64,
    /// Y translation.
    pub ty: f64,
}

impl Affine2 {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Applies `next` after `self`.
    #[must_use]
    pub fn then(self, next: Self) -> Self {
        Self {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            tx: next.a * self.tx + next.c * self.ty + next.tx,
            ty: next.b * self.tx + next.d * self.ty + next.ty,
        }
    }

    /// Appends a translation.
    #[must_use]
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        self.then(Self {
            tx: dx,
            ty: dy,
            ..Self::IDENTITY
        })
    }

    /// Appends a non-uniform scale.
    #[must_use]
    pub fn scale(self, sx: f64, sy: f64) -> Self {
        self.then(Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        })
    }

    /// Appends a rotation by `theta` radians.
    ///
    /// In a Y-down (screen) frame a positive angle turns clockwise.
    #[must_use]
    pub fn rotate(self, theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        self.then(Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        })
    }

    /// Maps a point.
    #[inline]
    #[must_use]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    /// Determinant of the linear part.
    #[inline]
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, or `None` when the transform is degenerate
    /// (e.g. a zero scale).
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        let a = self.d * inv;
        let b = -self.b * inv;
        let c = -self.c * inv;
        let d = self.a * inv;
        Some(Self {
            a,
            b,
            c,
            d,
            tx: -(a * self.tx + c * self.ty),
            ty: -(b * self.tx + d * self.ty),
        })
    }
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_steps_apply_in_order() {
        let t = Affine2::IDENTITY.translate(1.0, 0.0).scale(2.0, 3.0);
        assert!(close(t.apply(0.0, 1.0), (2.0, 3.0)));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let t = Affine2::IDENTITY.rotate(FRAC_PI_2);
        assert!(close(t.apply(1.0, 0.0), (0.0, 1.0)));
    }

    #[test]
    fn test_invert_round_trip() {
        let t = Affine2::IDENTITY
            .translate(-8.0, -8.0)
            .scale(2.0, 0.5)
            .rotate(0.7)
            .translate(320.0, 240.0);
        let inv = t.invert().unwrap();
        let (x, y) = t.apply(3.0, -4.0);
        assert!(close(inv.apply(x, y), (3.0, -4.0)));
    }

    #[test]
    fn test_zero_scale_has_no_inverse() {
        assert!(Affine2::IDENTITY.scale(0.0, 1.0).invert().is_none());
    }
}

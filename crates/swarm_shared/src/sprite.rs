//! # Sprite Identity & State
//!
//! A sprite is identified by a [`SpriteId`] handed out by the engine.
//! IDs are monotonic and never reused within a run, even across a
//! delete-all.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SpriteId(u64);

impl SpriteId {
    /// Wraps a raw ID value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw ID value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything an actor knows about one sprite.
///
/// This is what the position broker caches and what other actors read
/// back through `sprite_state`. It lags the engine by one message hop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteState {
    /// Sprite identifier.
    pub id: SpriteId,
    /// Application-defined entity type, reported by proximity queries.
    pub sprite_type: i32,
    /// Unique name given at creation.
    pub name: String,
    /// Costume currently worn, if any.
    pub costume: Option<String>,
    /// Cartesian X (0 is the middle of the screen).
    pub x: f64,
    /// Cartesian Y (0 is the middle of the screen, up is positive).
    pub y: f64,
    /// Draw layer, 0 through 9 with 9 on top.
    pub layer: u8,
    /// Rotation in degrees, counter-clockwise.
    pub angle_degrees: f64,
    /// Whether the sprite is drawn.
    pub visible: bool,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Opacity percentage: 0 is transparent, 100 is opaque.
    pub opacity: f64,
    /// Set when the sprite no longer exists.
    pub deleted: bool,
}

impl SpriteState {
    /// Default state for a freshly created sprite.
    #[must_use]
    pub fn new(id: SpriteId, name: impl Into<String>) -> Self {
        Self {
            id,
            sprite_type: 0,
            name: name.into(),
            costume: None,
            x: 0.0,
            y: 0.0,
            layer: 0,
            angle_degrees: 0.0,
            visible: false,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 100.0,
            deleted: false,
        }
    }

    /// Sentinel returned for IDs nobody knows about.
    #[must_use]
    pub fn deleted(id: SpriteId) -> Self {
        Self {
            deleted: true,
            ..Self::new(id, String::new())
        }
    }
}

/// Lightweight proximity-query result.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearMeInfo {
    /// Sprite identifier.
    pub id: SpriteId,
    /// Application-defined entity type.
    pub sprite_type: i32,
    /// Last reported X.
    pub x: f64,
    /// Last reported Y.
    pub y: f64,
}

impl NearMeInfo {
    /// Euclidean distance from this sprite to a point.
    ///
    /// Proximity queries return a superset of the true circle; callers
    /// that need exact containment filter with this.
    #[inline]
    #[must_use]
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

impl From<&SpriteState> for NearMeInfo {
    fn from(state: &SpriteState) -> Self {
        Self {
            id: state.id,
            sprite_type: state.sprite_type,
            x: state.x,
            y: state.y,
        }
    }
}

//! # Input Edge Tracking
//!
//! The host samples the keyboard and mouse once per tick into a
//! [`RawInput`]. The tracker turns consecutive samples into two
//! snapshots:
//!
//! - **pressed**: everything held right now, for polling;
//! - **just pressed**: held now but not on the previous sample, for the
//!   edge-triggered broadcast.
//!
//! Mouse positions are converted from window pixels to cartesian
//! coordinates (origin at screen centre, Y up).

use swarm_shared::{KeySet, MouseState, UserInput};

/// One raw input sample in window coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawInput {
    /// Keys held down.
    pub keys: KeySet,
    /// Mouse X in pixels from the left edge.
    pub mouse_x: f64,
    /// Mouse Y in pixels from the top edge.
    pub mouse_y: f64,
    /// Left button held.
    pub left: bool,
    /// Right button held.
    pub right: bool,
    /// Middle button held.
    pub middle: bool,
}

/// Snapshots derived from one sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
    /// Everything held now.
    pub pressed: UserInput,
    /// Everything newly held since the previous sample.
    pub just_pressed: UserInput,
}

/// Remembers the previous sample to find rising edges.
#[derive(Clone, Debug)]
pub struct InputTracker {
    half_width: f64,
    half_height: f64,
    previous: RawInput,
}

impl InputTracker {
    /// Creates a tracker for a window of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            half_width: f64::from(width) / 2.0,
            half_height: f64::from(height) / 2.0,
            previous: RawInput::default(),
        }
    }

    /// Converts window pixels to cartesian coordinates.
    #[inline]
    #[must_use]
    pub fn to_cartesian(&self, px: f64, py: f64) -> (f64, f64) {
        (px - self.half_width, self.half_height - py)
    }

    /// Consumes the next sample.
    pub fn update(&mut self, raw: &RawInput) -> InputFrame {
        let (x, y) = self.to_cartesian(raw.mouse_x, raw.mouse_y);
        let prev = self.previous;

        let held = MouseState {
            x,
            y,
            left: raw.left,
            right: raw.right,
            middle: raw.middle,
        };
        let pressed = UserInput {
            keys: raw.keys,
            mouse: held,
            any_pressed: !raw.keys.is_empty() || held.any_button(),
        };

        let new_keys = raw.keys.difference(prev.keys);
        let edges = MouseState {
            x,
            y,
            left: raw.left && !prev.left,
            right: raw.right && !prev.right,
            middle: raw.middle && !prev.middle,
        };
        let just_pressed = UserInput {
            keys: new_keys,
            mouse: edges,
            any_pressed: !new_keys.is_empty() || edges.any_button(),
        };

        self.previous = *raw;
        InputFrame {
            pressed,
            just_pressed,
        }
    }
}

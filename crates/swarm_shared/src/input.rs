//! # Input Snapshots
//!
//! The engine samples input once per tick and produces two snapshots:
//! everything currently held ("pressed") and everything that went down
//! this tick ("just pressed"). Both use the same [`UserInput`] shape.

use serde::{Deserialize, Serialize};

/// Keyboard key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    Space,
    Enter,
    Escape,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Shift,
    Control,
    Alt,
}

impl Key {
    /// Every key, in discriminant order.
    pub const ALL: [Self; 48] = [
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
        Self::G,
        Self::H,
        Self::I,
        Self::J,
        Self::K,
        Self::L,
        Self::M,
        Self::N,
        Self::O,
        Self::P,
        Self::Q,
        Self::R,
        Self::S,
        Self::T,
        Self::U,
        Self::V,
        Self::W,
        Self::X,
        Self::Y,
        Self::Z,
        Self::Num0,
        Self::Num1,
        Self::Num2,
        Self::Num3,
        Self::Num4,
        Self::Num5,
        Self::Num6,
        Self::Num7,
        Self::Num8,
        Self::Num9,
        Self::Space,
        Self::Enter,
        Self::Escape,
        Self::Backspace,
        Self::Tab,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Shift,
        Self::Control,
        Self::Alt,
    ];

    #[inline]
    const fn bit(self) -> u64 {
        1 << (self as u8)
    }
}

/// Set of keys packed into a bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySet(u64);

impl KeySet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Adds a key.
    #[inline]
    pub fn insert(&mut self, key: Key) {
        self.0 |= key.bit();
    }

    /// Removes a key.
    #[inline]
    pub fn remove(&mut self, key: Key) {
        self.0 &= !key.bit();
    }

    /// Whether the key is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, key: Key) -> bool {
        self.0 & key.bit() != 0
    }

    /// Whether the set is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Keys in `self` that are not in `other`.
    #[inline]
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Number of keys in the set.
    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates the keys in the set.
    pub fn iter(self) -> impl Iterator<Item = Key> {
        Key::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl FromIterator<Key> for KeySet {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for key in iter {
            set.insert(key);
        }
        set
    }
}

/// Mouse position (cartesian, origin at screen centre) and buttons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MouseState {
    /// Cartesian X.
    pub x: f64,
    /// Cartesian Y (up is positive).
    pub y: f64,
    /// Left button.
    pub left: bool,
    /// Right button.
    pub right: bool,
    /// Middle button.
    pub middle: bool,
}

impl MouseState {
    /// Whether any button is flagged.
    #[inline]
    #[must_use]
    pub const fn any_button(&self) -> bool {
        self.left || self.right || self.middle
    }
}

/// One input snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInput {
    /// Keys in this snapshot.
    pub keys: KeySet,
    /// Mouse position and buttons.
    pub mouse: MouseState,
    /// Whether any key or button is flagged.
    pub any_pressed: bool,
}

impl UserInput {
    /// Whether a key is flagged in this snapshot.
    #[inline]
    #[must_use]
    pub const fn key(&self, key: Key) -> bool {
        self.keys.contains(key)
    }
}

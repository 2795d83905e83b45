//! # Engine Commands
//!
//! Everything an actor can ask of the engine. Commands are sent over a
//! bounded queue from any thread and applied, in per-sender order, by the
//! tick thread.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::Sender;
use image::RgbaImage;
use swarm_shared::SpriteId;

use crate::sound::DecodedSound;

/// Every field an actor can change in one go.
///
/// Angles are radians, counter-clockwise.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteUpdate {
    /// Target sprite.
    pub id: SpriteId,
    /// Costume name; `None` takes the costume off.
    pub costume: Option<String>,
    /// Cartesian X.
    pub x: f64,
    /// Cartesian Y.
    pub y: f64,
    /// Rotation in radians.
    pub angle: f64,
    /// Draw layer, 0 through 9.
    pub layer: u8,
    /// Whether the sprite is drawn.
    pub visible: bool,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Opacity, 0 through 100.
    pub opacity: f64,
}

/// A request sent to the engine.
pub enum Command {
    /// Creates an invisible, costume-less sprite on layer 0.
    AddSprite(SpriteId),
    /// Moves and rotates a sprite. The hot path.
    UpdateMinimal {
        /// Target sprite.
        id: SpriteId,
        /// Cartesian X.
        x: f64,
        /// Cartesian Y.
        y: f64,
        /// Rotation in radians.
        angle: f64,
    },
    /// Sets every mutable field, including layer and costume.
    UpdateFull(SpriteUpdate),
    /// Registers a costume, replacing any costume with the same name.
    AddCostume {
        /// Costume name.
        name: String,
        /// Decoded pixels.
        image: Arc<RgbaImage>,
    },
    /// Removes one sprite.
    DeleteSprite(SpriteId),
    /// Removes every sprite. IDs keep counting up.
    DeleteAll,
    /// Registers a decoded sound under a name.
    AddSound {
        /// Sound name.
        name: String,
        /// Decoded sound.
        sound: DecodedSound,
    },
    /// Plays a registered sound.
    PlaySound {
        /// Sound name.
        name: String,
        /// Volume, clamped to 0.0 through 1.0.
        volume: f64,
    },
    /// Asks for a copy of the next rendered frame.
    Screenshot(Sender<RgbaImage>),
}

impl Command {
    /// Short name for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AddSprite(_) => "add_sprite",
            Self::UpdateMinimal { .. } => "update_minimal",
            Self::UpdateFull(_) => "update_full",
            Self::AddCostume { .. } => "add_costume",
            Self::DeleteSprite(_) => "delete_sprite",
            Self::DeleteAll => "delete_all",
            Self::AddSound { .. } => "add_sound",
            Self::PlaySound { .. } => "play_sound",
            Self::Screenshot(_) => "screenshot",
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddSprite(id) | Self::DeleteSprite(id) => {
                write!(f, "{}({id})", self.kind())
            }
            Self::UpdateMinimal { id, x, y, angle } => f
                .debug_struct("UpdateMinimal")
                .field("id", id)
                .field("x", x)
                .field("y", y)
                .field("angle", angle)
                .finish(),
            Self::UpdateFull(update) => f.debug_tuple("UpdateFull").field(update).finish(),
            Self::AddCostume { name, image } => f
                .debug_struct("AddCostume")
                .field("name", name)
                .field("size", &image.dimensions())
                .finish(),
            Self::AddSound { name, sound } => f
                .debug_struct("AddSound")
                .field("name", name)
                .field("format", &sound.format())
                .finish(),
            Self::PlaySound { name, volume } => f
                .debug_struct("PlaySound")
                .field("name", name)
                .field("volume", volume)
                .finish(),
            Self::DeleteAll | Self::Screenshot(_) => f.write_str(self.kind()),
        }
    }
}

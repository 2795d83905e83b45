//! # Engine Error Types

use std::io;
use std::path::PathBuf;

use swarm_shared::SpriteId;
use thiserror::Error;

/// Why a command was skipped.
///
/// Returned by the engine's apply step and logged by `tick`. Never stops
/// the tick loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No live sprite has this ID.
    #[error("unknown sprite {0}")]
    UnknownSprite(SpriteId),

    /// A sprite with this ID already exists.
    #[error("sprite {0} already exists")]
    DuplicateSprite(SpriteId),

    /// No costume was registered under this name.
    #[error("unknown costume {0:?}")]
    UnknownCostume(String),

    /// No sound was registered under this name.
    #[error("unknown sound {0:?}")]
    UnknownSound(String),

    /// Layer outside 0 through 9.
    #[error("layer {0} out of range")]
    LayerOutOfRange(u8),
}

/// Result type for applying a command.
pub type CommandResult<T> = Result<T, CommandError>;

/// Failure to move a costume, a sound or a frame between memory and a file.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The file could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The image codec rejected the data.
    #[error("image codec failed: {0}")]
    Image(#[from] image::ImageError),

    /// Not a container format the backend understands.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Recognised format, broken contents.
    #[error("corrupt data: {0}")]
    Corrupt(String),
}

/// Result type for decoding resources.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors talking to the engine from another thread.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The engine has been dropped; nothing will consume commands.
    #[error("engine is gone")]
    Disconnected,

    /// The engine went away before answering a screenshot request.
    #[error("screenshot request dropped")]
    ScreenshotDropped,
}

/// Result type for engine handle operations.
pub type EngineResult<T> = Result<T, EngineError>;

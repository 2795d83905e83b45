//! # Facade Error Types

use std::io;
use std::path::PathBuf;

use swarm_engine::{DecodeError, EngineError};
use swarm_shared::SpriteId;
use thiserror::Error;

/// Problems loading or validating a [`crate::SimConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors returned to actor code.
#[derive(Error, Debug)]
pub enum SimError {
    /// No live sprite has this ID or name.
    #[error("unknown sprite {0}")]
    UnknownSprite(SpriteId),

    /// No sprite has this name.
    #[error("no sprite named {0:?}")]
    UnknownName(String),

    /// The target's inbox is full; the message was dropped.
    #[error("mailbox of {0} is full")]
    MailboxFull(SpriteId),

    /// The engine is gone or dropped the request.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A costume or sound failed to decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Bad configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The start thread could not be spawned.
    #[error("failed to spawn start thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Result type for facade operations.
pub type SimResult<T> = Result<T, SimError>;

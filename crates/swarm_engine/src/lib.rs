//! # SWARM Engine
//!
//! Turns commands from any number of actor threads into one serialized
//! scene update and draw per tick.
//!
//! ## Per-tick flow
//!
//! ```text
//!   host ──► feed_input(raw) ──► tick() ──► draw(canvas)
//!              │                   │           │
//!              │                   │           └─ layers 0..9, then screenshot replies
//!              │                   └─ compact, then drain and apply queued commands
//!              └─ pressed snapshot + just-pressed broadcast
//! ```
//!
//! ## Failure policy
//!
//! A command naming an unknown sprite, costume or sound, or an invalid
//! layer, is logged and skipped. Nothing a command does can stop `tick`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod canvas;
pub mod command;
pub mod costume;
pub mod engine;
pub mod error;
pub mod input;
pub mod scene;
pub mod sound;
pub mod tick;

pub use canvas::{Canvas, FrameBuffer};
pub use command::{Command, SpriteUpdate};
pub use costume::{decode_png, load_png, save_png, Costume, CostumeId, CostumeTable};
pub use engine::{placement, Engine, EngineConfig, EngineHandle, IdAllocator, TickReport};
pub use error::{
    CommandError, CommandResult, DecodeError, DecodeResult, EngineError, EngineResult,
};
pub use input::{InputFrame, InputTracker, RawInput};
pub use scene::{Scene, SpriteRecord};
pub use sound::{sniff_format, AudioBackend, DecodedSound, SilentAudio, SoundBank, SoundFormat};
pub use tick::{TickClock, TickStats};

//! # SWARM Shared Types
//!
//! Plain data passed between actors, the position broker and the engine.
//!
//! ## Contents
//!
//! - `constants`: layer range, queue capacities
//! - `sprite`: sprite identifiers and the state an actor reports
//! - `input`: pressed / just-pressed input snapshots
//! - `math`: 2D affine transform used to place costumes on screen

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod constants;
pub mod input;
pub mod math;
pub mod sprite;

pub use constants::{
    COMMAND_QUEUE_CAPACITY, DEFAULT_TICK_RATE, INPUT_BUFFER_SIZE, MAILBOX_CAPACITY, MAX_LAYER,
    NUM_LAYERS,
};
pub use input::{Key, KeySet, MouseState, UserInput};
pub use math::{degrees_to_radians, radians_to_degrees, Affine2};
pub use sprite::{NearMeInfo, SpriteId, SpriteState};

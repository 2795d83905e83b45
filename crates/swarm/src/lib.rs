//! # SWARM
//!
//! Many actors, each on its own thread, steering sprites that one tick
//! loop draws.
//!
//! ```text
//!   actor threads                          host thread
//!   ─────────────                          ───────────
//!   Sprite::set_position ──► command queue ──► Engine::tick ──► Engine::draw
//!          │
//!          └──► PositionBroker ◄── Sim::who_is_near_me
//!
//!   Engine::feed_input ──► input Broker ──► Sprite::just_pressed_input
//! ```
//!
//! Start with [`run`]: it builds the engine, hands a [`Sim`] to your start
//! function on its own thread, and runs the host loop until
//! [`Sim::exit`] is called.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod game_loop;
pub mod sim;
pub mod sprite;

use std::sync::Arc;
use std::thread;

use swarm_engine::{AudioBackend, Canvas, Engine, FrameBuffer};

pub use config::SimConfig;
pub use error::{ConfigError, SimError, SimResult};
pub use game_loop::{GameLoop, InputSource, LoopStats, NoInput, ScriptedInput};
pub use sim::{Message, Sim};
pub use sprite::Sprite;

pub use swarm_core::{Body, GridConfig, Subscription};
pub use swarm_engine::{RawInput, SilentAudio};
pub use swarm_shared::{Key, KeySet, MouseState, NearMeInfo, SpriteId, SpriteState, UserInput};

/// Runs a headless simulation with a software frame buffer and no input.
///
/// `start` gets its own thread and may spawn as many actor threads as it
/// likes. Returns once an actor calls [`Sim::exit`].
///
/// # Errors
///
/// [`SimError::Config`] for an invalid config, [`SimError::Spawn`] if the
/// start thread can't be created.
pub fn run<F>(config: SimConfig, audio: Arc<dyn AudioBackend>, start: F) -> SimResult<LoopStats>
where
    F: FnOnce(Sim) + Send + 'static,
{
    let canvas = FrameBuffer::new(config.width, config.height);
    run_with(config, audio, canvas, NoInput, start)
}

/// Like [`run`], with a host-supplied canvas and input source.
///
/// # Errors
///
/// As [`run`].
pub fn run_with<C, I, F>(
    config: SimConfig,
    audio: Arc<dyn AudioBackend>,
    canvas: C,
    input: I,
    start: F,
) -> SimResult<LoopStats>
where
    C: Canvas,
    I: InputSource,
    F: FnOnce(Sim) + Send + 'static,
{
    config.validate()?;
    let engine = Engine::new(&config.engine_config(), Arc::clone(&audio));
    let tick_rate = config.tick_rate;
    let sim = Sim::new(engine.handle(), audio, config);

    thread::Builder::new()
        .name("swarm-start".to_string())
        .spawn(move || start(sim))
        .map_err(SimError::Spawn)?;

    Ok(GameLoop::new(engine, canvas, input, tick_rate).run())
}

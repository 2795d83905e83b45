//! # Host Loop
//!
//! Drives the engine at a fixed rate without a window:
//!
//! ```text
//!   loop until exit requested:
//!       sample input ──► feed_input ──► tick ──► draw ──► wait for next period
//!   then:
//!       stop the input broker (subscribers see end-of-stream)
//! ```
//!
//! A windowing host can reuse it by supplying its own [`Canvas`] and
//! [`InputSource`].

use std::collections::VecDeque;

use swarm_core::BrokerError;
use swarm_engine::{Canvas, Engine, RawInput, TickClock, TickReport, TickStats};
use tracing::{debug, info};

/// Supplies one raw input sample per step.
pub trait InputSource {
    /// The sample for this step.
    fn sample(&mut self) -> RawInput;
}

/// Nothing ever pressed.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn sample(&mut self) -> RawInput {
        RawInput::default()
    }
}

/// Replays queued samples, then nothing.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    frames: VecDeque<RawInput>,
}

impl ScriptedInput {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a sample for a later step.
    pub fn push(&mut self, raw: RawInput) {
        self.frames.push_back(raw);
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self) -> RawInput {
        self.frames.pop_front().unwrap_or_default()
    }
}

/// Totals over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Steps executed.
    pub frames: u64,
    /// Commands applied.
    pub applied: u64,
    /// Commands logged and skipped.
    pub skipped: u64,
    /// Step timing, if the loop was paced.
    pub timing: Option<TickStats>,
}

/// Engine, canvas, input source and clock.
pub struct GameLoop<C, I> {
    engine: Engine,
    canvas: C,
    input: I,
    clock: TickClock,
    stats: LoopStats,
}

impl<C: Canvas, I: InputSource> GameLoop<C, I> {
    /// Creates a loop stepping `tick_rate` times per second.
    #[must_use]
    pub fn new(engine: Engine, canvas: C, input: I, tick_rate: u32) -> Self {
        Self {
            engine,
            canvas,
            input,
            clock: TickClock::new(tick_rate),
            stats: LoopStats::default(),
        }
    }

    /// The engine.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The canvas.
    #[must_use]
    pub const fn canvas(&self) -> &C {
        &self.canvas
    }

    /// The input source.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Totals so far.
    #[must_use]
    pub const fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Runs exactly one input + tick + draw.
    pub fn step(&mut self) -> TickReport {
        let raw = self.input.sample();
        self.engine.feed_input(&raw);
        let report = self.engine.tick();
        self.engine.draw(&mut self.canvas);

        self.stats.frames += 1;
        self.stats.applied += report.applied as u64;
        self.stats.skipped += report.skipped as u64;
        report
    }

    /// Steps at the configured rate until an exit is requested, then
    /// closes every just-pressed subscription.
    pub fn run(mut self) -> LoopStats {
        info!(period_us = self.clock.period().as_micros() as u64, "host loop started");

        while !self.engine.exit_requested() {
            let start = self.clock.begin();
            self.step();
            self.clock.end(start);
            self.clock.wait();
        }

        match self.engine.handle().input_broker().stop() {
            Ok(()) | Err(BrokerError::AlreadyStopped) => {}
            Err(err) => debug!(%err, "input broker already gone"),
        }

        self.stats.timing = Some(*self.clock.stats());
        info!(
            frames = self.stats.frames,
            applied = self.stats.applied,
            skipped = self.stats.skipped,
            "host loop stopped"
        );
        self.stats
    }
}

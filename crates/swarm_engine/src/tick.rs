//! # Tick Clock
//!
//! Fixed-rate pacing for the host loop. The host calls `tick` and then
//! `draw` once per period; when a step overruns, the clock does not try
//! to catch up with a burst of steps.

use std::time::{Duration, Instant};

/// Per-step timing statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickStats {
    /// Shortest step in microseconds.
    pub min_step_us: u64,
    /// Longest step in microseconds.
    pub max_step_us: u64,
    /// Rolling average step in microseconds.
    pub avg_step_us: u64,
    /// Steps that took longer than one period.
    pub late_steps: u64,
    /// Steps measured.
    pub total_steps: u64,
}

impl TickStats {
    fn new(period: Duration) -> Self {
        Self {
            min_step_us: u64::MAX,
            max_step_us: 0,
            avg_step_us: period.as_micros() as u64,
            late_steps: 0,
            total_steps: 0,
        }
    }
}

/// Fixed-rate step controller.
#[derive(Debug)]
pub struct TickClock {
    period: Duration,
    next_due: Instant,
    stats: TickStats,
}

impl TickClock {
    /// Creates a clock running `rate` steps per second. A rate of zero is
    /// treated as one.
    #[must_use]
    pub fn new(rate: u32) -> Self {
        let period = Duration::from_micros(1_000_000 / u64::from(rate.max(1)));
        Self {
            period,
            next_due: Instant::now(),
            stats: TickStats::new(period),
        }
    }

    /// Target step period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Statistics so far.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Marks the start of a step.
    #[must_use]
    pub fn begin(&self) -> Instant {
        Instant::now()
    }

    /// Marks the end of a step that started at `start`.
    pub fn end(&mut self, start: Instant) {
        let elapsed = start.elapsed();
        let elapsed_us = elapsed.as_micros() as u64;

        self.stats.total_steps += 1;
        self.stats.min_step_us = self.stats.min_step_us.min(elapsed_us);
        self.stats.max_step_us = self.stats.max_step_us.max(elapsed_us);
        self.stats.avg_step_us = (self.stats.avg_step_us * 15 + elapsed_us) / 16;
        if elapsed > self.period {
            self.stats.late_steps += 1;
        }

        self.next_due += self.period;
        let now = Instant::now();
        if self.next_due < now {
            // Overran: restart the schedule rather than bursting.
            self.next_due = now;
        }
    }

    /// Sleeps until the next step is due.
    pub fn wait(&self) {
        let now = Instant::now();
        if self.next_due > now {
            std::thread::sleep(self.next_due - now);
        }
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(swarm_shared::DEFAULT_TICK_RATE)
    }
}

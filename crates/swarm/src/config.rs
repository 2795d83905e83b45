//! # Simulation Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an
//! empty file is valid:
//!
//! ```toml
//! width = 800
//! height = 600
//! tick_rate = 60
//!
//! [grid]
//! cells_x = 100
//! cells_y = 100
//! cell_size = 20.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use swarm_core::GridConfig;
use swarm_engine::EngineConfig;
use swarm_shared::{COMMAND_QUEUE_CAPACITY, DEFAULT_TICK_RATE, INPUT_BUFFER_SIZE, MAILBOX_CAPACITY};

use crate::error::ConfigError;

/// Everything needed to start a simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Screen width in pixels.
    pub width: u32,
    /// Screen height in pixels.
    pub height: u32,
    /// Ticks (and draws) per second.
    pub tick_rate: u32,
    /// Commands buffered before actors block.
    pub command_queue_capacity: usize,
    /// Per-subscriber buffer for just-pressed input.
    pub input_buffer: usize,
    /// Messages each sprite's inbox holds.
    pub mailbox_capacity: usize,
    /// RGBA clear colour.
    pub background: [u8; 4],
    /// Position broker grid.
    pub grid: GridConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            tick_rate: DEFAULT_TICK_RATE,
            command_queue_capacity: COMMAND_QUEUE_CAPACITY,
            input_buffer: INPUT_BUFFER_SIZE,
            mailbox_capacity: MAILBOX_CAPACITY,
            background: [0, 0, 0, 255],
            grid: GridConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML,
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file can't be read, otherwise as
    /// [`SimConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that every size and rate is usable.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.width == 0 || self.height == 0 {
            return invalid("width and height must be non-zero");
        }
        if self.tick_rate == 0 {
            return invalid("tick_rate must be greater than zero");
        }
        if self.command_queue_capacity == 0 {
            return invalid("command_queue_capacity must be non-zero");
        }
        if self.input_buffer == 0 || self.mailbox_capacity == 0 {
            return invalid("input_buffer and mailbox_capacity must be non-zero");
        }
        if self.grid.cells_x == 0 || self.grid.cells_y == 0 {
            return invalid("grid must have at least one cell on each axis");
        }
        if !self.grid.fits() {
            return Err(ConfigError::Invalid(format!(
                "grid may hold at most {} cells",
                GridConfig::MAX_CELLS
            )));
        }
        if !(self.grid.cell_size.is_finite() && self.grid.cell_size > 0.0) {
            return invalid("grid.cell_size must be a positive number");
        }
        Ok(())
    }

    /// Engine parameters derived from this config.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            width: self.width,
            height: self.height,
            queue_capacity: self.command_queue_capacity,
            input_buffer: self.input_buffer,
            background: self.background,
        }
    }
}

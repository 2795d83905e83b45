//! # Engine Constants
//!
//! Defaults used when no config file overrides them.

// =============================================================================
// SCENE
// =============================================================================

/// Number of draw layers. Layer 0 is painted first, layer 9 last (topmost).
pub const NUM_LAYERS: usize = 10;

/// Highest valid layer index.
pub const MAX_LAYER: u8 = (NUM_LAYERS - 1) as u8;

// =============================================================================
// QUEUES
// =============================================================================

/// Commands that may be in flight before senders block.
pub const COMMAND_QUEUE_CAPACITY: usize = 100_000;

/// Per-subscriber buffer for edge-triggered input.
pub const INPUT_BUFFER_SIZE: usize = 100;

/// Messages an actor's inbox holds before new ones are dropped.
pub const MAILBOX_CAPACITY: usize = 64;

// =============================================================================
// TIMING
// =============================================================================

/// Host tick rate (ticks per second).
pub const DEFAULT_TICK_RATE: u32 = 60;

//! # SWARM Core
//!
//! The pieces many actors touch at once, none of which know about the
//! engine:
//!
//! - [`Body`]: composite circle/rectangle shape for click detection
//! - [`Broker`]: generic fan-out of messages to a dynamic subscriber set
//! - [`PositionBroker`]: grid index answering "who is near me"
//!
//! ## Locking
//!
//! ```text
//!   Broker            one coordinator thread owns the subscriber set
//!   PositionBroker    table lock  ->  record lock  ->  cell lock
//! ```
//!
//! The position broker always acquires locks in that order. Proximity
//! queries take only cell locks.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod body;
pub mod broker;
pub mod error;
pub mod spatial;

pub use body::Body;
pub use broker::{Broker, BrokerState, Subscription};
pub use error::{BrokerError, BrokerResult};
pub use spatial::{GridConfig, PositionBroker};

//! # Core Error Types

use thiserror::Error;

/// Errors returned by [`crate::Broker`] control operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerError {
    /// `stop` was already called on this broker.
    #[error("broker already stopped")]
    AlreadyStopped,

    /// The coordinator thread has exited.
    #[error("broker terminated")]
    Terminated,
}

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

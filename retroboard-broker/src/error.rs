//! Error types for the bus layer.

use thiserror::Error;

/// Result type for bus operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Errors that can occur on the bus.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Error from the Redis backend.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Envelope (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The in-process side of a queue or subscription is gone.
    #[error("channel closed")]
    ChannelClosed,
}

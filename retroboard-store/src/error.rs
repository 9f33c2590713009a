//! Error types for the store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A set-if-absent found the key taken.
    #[error("'{0}' already exists")]
    AlreadyExists(String),

    /// A required key was not found.
    #[error("'{0}' does not exist")]
    DoesNotExist(String),

    /// The incoming board cannot be reconciled with the stored one.
    /// Not retried: the update is structurally wrong, not contended.
    #[error("merge rejected: {0}")]
    Merge(#[from] retroboard_merge::MergeError),

    /// Board (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error from the Redis backend.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The optimistic-lock loop gave up.
    #[error("compare-and-swap retries exhausted after {0} attempts")]
    RetriesExhausted(u32),
}

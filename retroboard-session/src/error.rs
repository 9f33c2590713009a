//! Error types for the session layer.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that terminate one half of a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Transport-level read or write failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport is already gone.
    #[error("transport closed")]
    TransportClosed,

    /// An inbound frame could not be decoded into a board.
    #[error("decode error: {0}")]
    Decode(String),
}

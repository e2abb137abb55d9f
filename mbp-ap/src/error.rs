//! Error types for mbp-ap
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for mbp-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Transport operation attempted with no tracks
    #[error("Nothing to play: playlist is empty")]
    EmptyPlaylist,

    /// Resource acquire failed (bad locator, decode or I/O error)
    #[error("Acquire failed: {0}")]
    AcquireFailed(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Operation issued against a resource in the wrong lifecycle state
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// Session task has shut down
    #[error("Session closed")]
    SessionClosed,

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors from shared mbp-common helpers
    #[error(transparent)]
    Common(#[from] mbp_common::Error),
}

/// Convenience Result type using mbp-ap Error
pub type Result<T> = std::result::Result<T, Error>;

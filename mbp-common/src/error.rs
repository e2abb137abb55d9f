//! Common error types for MBP

use thiserror::Error;

/// Common result type for MBP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the MBP crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

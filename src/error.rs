//! Error types for pairhub.

use thiserror::Error;

/// Common error type for pairhub.
#[derive(Error, Debug)]
pub enum PairhubError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for configuration values.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result type alias for pairhub operations.
pub type Result<T> = std::result::Result<T, PairhubError>;

//! Error types for the CRPT client.

use thiserror::Error;

use crate::ratelimit::GateClosed;

/// Main error type for CRPT client operations.
#[derive(Error, Debug)]
pub enum CrptError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The submission was abandoned before any request went out
    #[error("Submission cancelled: {0}")]
    Cancelled(#[from] GateClosed),

    /// The request could not be delivered or the response not read
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request body encoding errors
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CRPT client operations.
pub type Result<T> = std::result::Result<T, CrptError>;

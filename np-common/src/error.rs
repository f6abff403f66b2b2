//! Common error types for NeuroPulse

use thiserror::Error;

/// Common result type for NeuroPulse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across NeuroPulse microservices
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model backend failed or returned something unusable
    #[error("Inference error: {0}")]
    Inference(String),
}

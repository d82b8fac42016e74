//! Error types for the Redis DB exchange core

use thiserror::Error;

/// The main error type for exchange core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Payload validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] crate::schema::ValidationError),
}

/// A specialized Result type for exchange core operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

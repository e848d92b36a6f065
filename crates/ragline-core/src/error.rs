//! Error types for the ragline pipeline

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the ragline system
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the orchestrator may retry the failed call.
    ///
    /// Only transient dependency failures (timeouts, connection loss,
    /// throttling) qualify; validation, storage, and provider rejections
    /// surface immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::DependencyUnavailable(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Provider(err.to_string())
    }
}

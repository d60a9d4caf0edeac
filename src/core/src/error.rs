//! Error types shared across pathgate crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for pathgate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Digest name not recognised
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Path could not be interpreted
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl CoreError {
    /// Create an unsupported algorithm error
    pub fn unsupported_algorithm<S: Into<String>>(name: S) -> Self {
        CoreError::UnsupportedAlgorithm(name.into())
    }

    /// Create an invalid path error
    pub fn invalid_path<S: Into<String>>(msg: S) -> Self {
        CoreError::InvalidPath(msg.into())
    }
}

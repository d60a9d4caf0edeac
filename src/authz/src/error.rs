//! Error types for the authorization and session layer
//!
//! None of these reach the host through the decision or identity entry
//! points: those log the error and fall back to the safe default.

use pathgate_core::CoreError;
use thiserror::Error;

/// Authorization and session errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A configuration section had the wrong shape
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The session store could not complete an operation
    #[error("Session store error: {0}")]
    SessionStore(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error from the core crate
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AuthzError {
    /// Create an invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        AuthzError::InvalidConfig(msg.into())
    }

    /// Create a session store error
    pub fn session_store<S: Into<String>>(msg: S) -> Self {
        AuthzError::SessionStore(msg.into())
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;

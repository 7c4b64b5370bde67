//! Domain-specific error types and error handling.

mod types;


// Re-export all error types
pub use types::{RevocationError, StorageError, TokenError};

use thiserror::Error;
use tg_shared::ConfigError;

/// Core domain errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Revocation(#[from] RevocationError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl DomainError {
    /// Build a configuration error from any displayable message
    pub fn configuration(message: impl Into<String>) -> Self {
        DomainError::Configuration {
            message: message.into(),
        }
    }

    /// Whether the failure is a transient storage condition worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            DomainError::Storage(err) => err.is_transient(),
            _ => false,
        }
    }
}

impl From<ConfigError> for DomainError {
    fn from(err: ConfigError) -> Self {
        DomainError::Configuration {
            message: err.to_string(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

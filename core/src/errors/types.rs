//! Error types for revocation storage, id validation and the token flow

use thiserror::Error;

/// Failures raised by a revocation store backend
///
/// Transient variants are retried by `RetryingStore`; the rest are returned
/// to the caller immediately.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend unavailable: {message}")]
    Unavailable { message: String },

    #[error("Storage operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Failed to write revocation record: {message}")]
    WriteFailed { message: String },

    #[error("Storage I/O error: {message}")]
    Io { message: String },

    #[error("Malformed revocation record '{id}': {message}")]
    MalformedRecord { id: String, message: String },

    #[error("Storage backend error: {message}")]
    Backend { message: String },

    #[error("Storage backend rejected the request: {message}")]
    Rejected { message: String },

    #[error("Failed to encode revocation record: {message}")]
    Encoding { message: String },

    #[error("Operation {operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<StorageError>,
    },
}

impl StorageError {
    /// Whether repeating the operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StorageError::Unavailable { .. }
                | StorageError::Timeout { .. }
                | StorageError::WriteFailed { .. }
                | StorageError::Io { .. }
                | StorageError::Backend { .. }
        )
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io {
            message: err.to_string(),
        }
    }
}

/// Token id validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RevocationError {
    #[error("Token id is missing")]
    MissingTokenId,

    #[error("Invalid token id '{id}': {reason}")]
    InvalidTokenId { id: String, reason: String },
}

/// Token-related errors
///
/// These errors represent token validation and management failures.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token format")]
    InvalidTokenFormat,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token not yet valid")]
    TokenNotYetValid,

    #[error("Invalid claims: {message}")]
    InvalidClaims { message: String },

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Token generation failed: {message}")]
    TokenGenerationFailed { message: String },
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::TokenExpired,
            ErrorKind::ImmatureSignature => TokenError::TokenNotYetValid,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience | ErrorKind::MissingRequiredClaim(_) => {
                TokenError::InvalidClaims {
                    message: err.to_string(),
                }
            }
            _ => TokenError::InvalidTokenFormat,
        }
    }
}

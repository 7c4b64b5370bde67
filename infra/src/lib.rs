//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for TokenGuard,
//! following Clean Architecture principles. It provides the concrete
//! revocation store backends and wires them together from configuration.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **File**: one JSON record per revoked token id in a local directory
//! - **Cache**: Redis and Memcached stores relying on native key expiry
//! - **Database**: MySQL table store using SQLx
//! - **Factory**: builds the configured store, retry wrapper, gate and scheduler
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis caching support (default)
//! - `memcached`: Enable the Memcached store (default)

use std::future::Future;
use std::time::Duration;

// Re-export core types for convenience
pub use tg_core::errors::*;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Cache module - Redis revocation store
pub mod cache;

/// File module - Local directory revocation store
pub mod file;

/// Factory module - Store selection and service wiring
pub mod factory;

pub use factory::{
    build_gate, build_store, build_sweep_scheduler, initialize, initialize_with_clock,
    RevocationServices,
};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Memcached client error
    #[cfg(feature = "memcached")]
    #[error("Memcached error: {0}")]
    Memcache(#[from] memcache::MemcacheError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote call exceeded its deadline
    #[error("Operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        match err {
            InfrastructureError::Database(e) => database_error(e),
            InfrastructureError::Cache(e) => cache::redis_store::classify_redis_error(e),
            #[cfg(feature = "memcached")]
            InfrastructureError::Memcache(e) => cache::memcached_store::classify_memcache_error(e),
            InfrastructureError::Io(e) => StorageError::from(e).into(),
            InfrastructureError::Serialization(e) => StorageError::Encoding {
                message: e.to_string(),
            }
            .into(),
            InfrastructureError::Timeout {
                operation,
                timeout_ms,
            } => StorageError::Timeout {
                operation,
                timeout_ms,
            }
            .into(),
            InfrastructureError::Config(message) => DomainError::Configuration { message },
        }
    }
}

fn database_error(err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Configuration(e) => DomainError::configuration(e.to_string()),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StorageError::Unavailable {
            message: err.to_string(),
        }
        .into(),
        other => StorageError::Backend {
            message: other.to_string(),
        }
        .into(),
    }
}

/// Bound a remote call by `timeout`
///
/// An elapsed deadline becomes [`InfrastructureError::Timeout`] naming `operation`.
pub async fn with_timeout<T, E, F>(
    operation: &str,
    timeout: Duration,
    future: F,
) -> Result<T, InfrastructureError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<InfrastructureError>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(InfrastructureError::Timeout {
            operation: operation.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

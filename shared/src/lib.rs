//! Shared configuration and common types for TokenGuard
//!
//! This crate provides functionality used across all workspace members:
//! - Configuration types for the revocation store, JWT signing and logging
//! - A layered configuration loader (TOML file + environment)
//! - Tracing subscriber initialisation
//! - Configuration error types

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AdvancedConfig, AppConfig, CacheConfig, DatabaseConfig, Environment, FileStoreConfig,
    JwtConfig, LogFormat, LoggingConfig, RevocationConfig, StorageBackendConfig, StorageConfig,
    StorageType,
};
pub use errors::{ConfigError, ConfigResult};

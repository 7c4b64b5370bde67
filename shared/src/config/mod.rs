//! Configuration module with concern-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `auth` - JWT signing configuration
//! - `cache` - Redis connection settings for the remote revocation cache
//! - `database` - MySQL connection and table settings
//! - `environment` - Environment detection and logging configuration
//! - `storage` - Revocation store selection, retry and cleanup settings

pub mod auth;
pub mod cache;
pub mod database;
pub mod environment;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{ConfigError, ConfigResult};

// Re-export commonly used types
pub use auth::JwtConfig;
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use environment::{init_tracing, Environment, LogFormat, LoggingConfig};
pub use storage::{
    is_valid_table_name, AdvancedConfig, FileStoreConfig, RevocationConfig,
    StorageBackendConfig, StorageConfig, StorageType,
};

/// Prefix for environment variable overrides, e.g. `REVOCATION__STORAGE__TYPE=file`
pub const ENV_PREFIX: &str = "REVOCATION";

/// Complete application configuration combining all sub-configurations
///
/// The revocation settings (`storage`, `advanced`, `file`) live at the top
/// level of the document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Deployment environment; `ENVIRONMENT` or `RUST_ENV` when not set in the file
    #[serde(default = "Environment::from_env")]
    pub environment: Environment,

    /// JWT signing configuration
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Revocation store configuration
    #[serde(flatten)]
    pub revocation: RevocationConfig,
}

impl AppConfig {
    /// Load configuration from an optional TOML file layered with environment overrides
    ///
    /// A `.env` file is honoured if present. Environment variables use the
    /// `REVOCATION__` prefix with `__` as the nesting separator.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        tracing::debug!(
            environment = %config.environment,
            storage = %config.revocation.storage.kind,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate every section
    ///
    /// Production additionally refuses the built-in JWT secret.
    pub fn validate(&self) -> ConfigResult<()> {
        self.jwt.validate()?;
        if self.environment.is_production() && self.jwt.is_using_default_secret() {
            return Err(ConfigError::Missing {
                field: "jwt.secret".to_string(),
            });
        }
        self.revocation.validate()
    }

    /// Configuration for development: file storage under the temp directory
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            jwt: JwtConfig::default(),
            logging: LoggingConfig::for_environment(Environment::Development),
            revocation: RevocationConfig::default(),
        }
    }

    /// Configuration for production: Redis storage with retries and periodic cleanup
    pub fn production() -> Self {
        let mut revocation = RevocationConfig::default();
        revocation.storage.kind = StorageType::RemoteCache;
        revocation.advanced.auto_cleanup = true;

        Self {
            environment: Environment::Production,
            jwt: JwtConfig::new("use-env-variable"),
            logging: LoggingConfig::for_environment(Environment::Production),
            revocation,
        }
    }
}

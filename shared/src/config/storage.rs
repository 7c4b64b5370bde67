//! Revocation store configuration
//!
//! Mirrors the configuration surface consumed by the revocation core:
//! `storage.type`, `storage.config.*`, `advanced.*` and `file.gc_probability`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::cache::{CacheConfig, DEFAULT_KEY_PREFIX};
use super::database::{DatabaseConfig, DEFAULT_TABLE_NAME};
use crate::errors::{ConfigError, ConfigResult};

static TABLE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").expect("valid regex"));

/// Check that a table name is safe to interpolate into SQL
pub fn is_valid_table_name(name: &str) -> bool {
    TABLE_NAME_PATTERN.is_match(name)
}

const DEFAULT_MEMCACHED_PORT: u16 = 11211;

/// Backend used to persist revoked token ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageType {
    /// One JSON record per token id in a local directory
    #[default]
    File,
    /// Redis with native key expiry
    #[serde(alias = "redis")]
    RemoteCache,
    /// MySQL table with an indexed expiry column
    #[serde(alias = "mysql")]
    Database,
    /// Memcached with native key expiry
    #[serde(alias = "memcached")]
    MemoryCache,
    /// In-process map, lost on restart
    #[serde(alias = "in-process")]
    Memory,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::File => write!(f, "file"),
            StorageType::RemoteCache => write!(f, "remote-cache"),
            StorageType::Database => write!(f, "database"),
            StorageType::MemoryCache => write!(f, "memory-cache"),
            StorageType::Memory => write!(f, "memory"),
        }
    }
}

/// Backend-specific connection settings (`storage.config.*`)
///
/// Every field is optional; only the ones relevant to the selected
/// [`StorageType`] are read.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageBackendConfig {
    /// Directory for the file backend
    pub path: Option<PathBuf>,
    /// Full connection URL (Redis, Memcached or MySQL); wins over host/port
    pub url: Option<String>,
    /// Redis or Memcached host
    pub host: Option<String>,
    /// Redis or Memcached port
    pub port: Option<u16>,
    /// Redis password
    pub password: Option<String>,
    /// Redis logical database
    pub database: Option<u8>,
    /// Redis or Memcached key prefix
    pub prefix: Option<String>,
    /// MySQL table name
    pub table_name: Option<String>,
    /// MySQL pool size
    pub max_connections: Option<u32>,
    /// Connection timeout in seconds
    pub connect_timeout_s: Option<u64>,
    /// Per-operation timeout in seconds
    pub operation_timeout_s: Option<u64>,
}

/// `storage` section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Selected backend
    #[serde(rename = "type")]
    pub kind: StorageType,

    /// Backend connection settings
    pub config: StorageBackendConfig,
}

/// `advanced` section: reliability and cleanup tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdvancedConfig {
    /// Attempts per store operation; 1 disables retrying
    pub retry_attempts: u32,
    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Run a periodic sweep of expired entries
    pub auto_cleanup: bool,
    /// Interval between periodic sweeps in seconds
    pub cleanup_interval_s: u64,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_ms: 100,
            auto_cleanup: false,
            cleanup_interval_s: 3600, // Run every hour
        }
    }
}

/// `file` section
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Probability in `[0, 1]` that an add triggers a background sweep
    pub gc_probability: f64,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            gc_probability: 0.1, // 10% of adds
        }
    }
}

/// Complete revocation store configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RevocationConfig {
    pub storage: StorageConfig,
    pub advanced: AdvancedConfig,
    pub file: FileStoreConfig,
}

impl RevocationConfig {
    /// Configuration for the given backend with all other settings at their defaults
    pub fn for_storage(kind: StorageType) -> Self {
        let mut config = Self::default();
        config.storage.kind = kind;
        config
    }

    /// Validate value ranges and backend-specific requirements
    pub fn validate(&self) -> ConfigResult<()> {
        if self.advanced.retry_attempts == 0 {
            return Err(ConfigError::invalid(
                "advanced.retry_attempts",
                "must be at least 1",
            ));
        }
        if self.advanced.auto_cleanup && self.advanced.cleanup_interval_s == 0 {
            return Err(ConfigError::invalid(
                "advanced.cleanup_interval_s",
                "must be positive when auto_cleanup is enabled",
            ));
        }
        if !(0.0..=1.0).contains(&self.file.gc_probability) {
            return Err(ConfigError::invalid(
                "file.gc_probability",
                format!("{} is outside [0, 1]", self.file.gc_probability),
            ));
        }

        if self.storage.kind == StorageType::Database {
            let table = self.table_name();
            if !is_valid_table_name(&table) {
                return Err(ConfigError::invalid(
                    "storage.config.table_name",
                    format!("'{}' is not a valid table name", table),
                ));
            }
        }

        Ok(())
    }

    /// Directory used by the file backend
    pub fn file_path(&self) -> PathBuf {
        self.storage
            .config
            .path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("jwt_blacklist"))
    }

    /// Redis settings derived from `storage.config`
    pub fn cache_config(&self) -> CacheConfig {
        let settings = &self.storage.config;
        let mut cache = match &settings.url {
            Some(url) => CacheConfig::new(url.clone()),
            None if settings.host.is_none() => CacheConfig::from_env(),
            None => CacheConfig::from_parts(
                settings.host.as_deref().unwrap_or("127.0.0.1"),
                settings.port.unwrap_or(6379),
                settings.password.as_deref(),
                settings.database.unwrap_or(0),
            ),
        };
        self.apply_cache_settings(&mut cache);
        cache
    }

    /// Memcached settings derived from `storage.config`
    ///
    /// Without a URL the server is `memcache://<host>:<port>`, defaulting to
    /// `127.0.0.1:11211`.
    pub fn memcached_config(&self) -> CacheConfig {
        let settings = &self.storage.config;
        let url = settings.url.clone().unwrap_or_else(|| {
            format!(
                "memcache://{}:{}",
                settings.host.as_deref().unwrap_or("127.0.0.1"),
                settings.port.unwrap_or(DEFAULT_MEMCACHED_PORT)
            )
        });
        let mut cache = CacheConfig::new(url);
        self.apply_cache_settings(&mut cache);
        cache
    }

    fn apply_cache_settings(&self, cache: &mut CacheConfig) {
        let settings = &self.storage.config;
        cache.key_prefix = Some(
            settings
                .prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
        );
        if let Some(timeout) = settings.connect_timeout_s {
            cache.connection_timeout = timeout;
        }
        if let Some(timeout) = settings.operation_timeout_s {
            cache.response_timeout = timeout;
        }
    }

    /// MySQL settings derived from `storage.config`
    pub fn database_config(&self) -> DatabaseConfig {
        let settings = &self.storage.config;
        let mut database = match &settings.url {
            Some(url) => DatabaseConfig::new(url.clone()),
            None => DatabaseConfig::from_env(),
        };
        database.table_name = self.table_name();
        if let Some(max) = settings.max_connections {
            database.max_connections = max;
        }
        if let Some(timeout) = settings.connect_timeout_s {
            database.connect_timeout = timeout;
        }
        if let Some(timeout) = settings.operation_timeout_s {
            database.statement_timeout = timeout;
        }
        database
    }

    fn table_name(&self) -> String {
        self.storage
            .config
            .table_name
            .clone()
            .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string())
    }
}

//! Database configuration module

use serde::{Deserialize, Serialize};

/// Default name of the revocation table
pub const DEFAULT_TABLE_NAME: &str = "jwt_blacklist";

/// Database configuration for the MySQL revocation table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Connection timeout in seconds
    pub connect_timeout: u64,

    /// Per-statement timeout in seconds
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout: u64,

    /// Table holding revoked token ids
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::from("mysql://localhost:3306/tokenguard"),
            max_connections: 10,
            connect_timeout: 30,
            statement_timeout: default_statement_timeout(),
            table_name: default_table_name(),
        }
    }
}

impl DatabaseConfig {
    /// Read `DATABASE_*` variables, falling back to defaults
    ///
    /// Recognised: `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`,
    /// `DATABASE_CONNECT_TIMEOUT`, `DATABASE_STATEMENT_TIMEOUT` and
    /// `DATABASE_REVOCATION_TABLE`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("DATABASE_URL").unwrap_or(defaults.url),
            max_connections: env_number("DATABASE_MAX_CONNECTIONS", defaults.max_connections),
            connect_timeout: env_number("DATABASE_CONNECT_TIMEOUT", defaults.connect_timeout),
            statement_timeout: env_number("DATABASE_STATEMENT_TIMEOUT", defaults.statement_timeout),
            table_name: std::env::var("DATABASE_REVOCATION_TABLE").unwrap_or(defaults.table_name),
        }
    }

    /// Create a new database configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the revocation table name
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }
}

fn env_number<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(fallback)
}

fn default_statement_timeout() -> u64 {
    5
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

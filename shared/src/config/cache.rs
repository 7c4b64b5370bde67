//! Redis configuration for the remote revocation cache

use serde::{Deserialize, Serialize};

/// Default key prefix for revoked token ids
pub const DEFAULT_KEY_PREFIX: &str = "jwt_blacklist";

/// Redis cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Redis connection URL
    pub url: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub connection_timeout: u64,

    /// Response timeout in seconds
    #[serde(default = "default_timeout")]
    pub response_timeout: u64,

    /// Cache key prefix
    #[serde(default)]
    pub key_prefix: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://localhost:6379"),
            connection_timeout: default_timeout(),
            response_timeout: default_timeout(),
            key_prefix: Some(DEFAULT_KEY_PREFIX.to_string()),
        }
    }
}

impl CacheConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379".to_string());

        Self {
            url,
            ..Default::default()
        }
    }

    /// Create a new cache configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Build a `redis://` URL from discrete connection settings
    pub fn from_parts(host: &str, port: u16, password: Option<&str>, database: u8) -> Self {
        let auth = match password {
            Some(password) if !password.is_empty() => format!(":{}@", password),
            _ => String::new(),
        };
        Self::new(format!("redis://{}{}:{}/{}", auth, host, port, database.min(15)))
    }

    /// Set the key prefix for all cache keys
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Set both connection and response timeouts
    pub fn with_timeouts(mut self, connection_timeout: u64, response_timeout: u64) -> Self {
        self.connection_timeout = connection_timeout;
        self.response_timeout = response_timeout;
        self
    }

    /// Generate a cache key with prefix
    pub fn make_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) if !prefix.is_empty() => {
                format!("{}:{}", prefix.trim_end_matches(':'), key)
            }
            _ => key.to_string(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}

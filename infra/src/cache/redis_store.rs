//! Redis revocation store
//!
//! Revoked ids are stored as `<prefix>:<id>` keys holding `"1"` with a TTL
//! equal to the remaining token lifetime, so Redis expires them natively and
//! sweeping is a no-op. Every command is bounded by the configured response
//! timeout.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client, RedisError};
use std::time::Duration;
use tracing::{debug, error, info};

use tg_core::domain::clock::{system_clock, SharedClock};
use tg_core::errors::{DomainError, DomainResult, StorageError};
use tg_core::repositories::RevocationStore;
use tg_shared::CacheConfig;

use crate::{with_timeout, InfrastructureError};

/// Revocation store backed by Redis key expiry
#[derive(Clone)]
pub struct RedisRevocationStore {
    /// Redis multiplexed connection for async operations
    connection: MultiplexedConnection,
    /// Configuration used to create this store
    config: CacheConfig,
    clock: SharedClock,
}

impl RedisRevocationStore {
    /// Connect using the system clock
    ///
    /// # Arguments
    /// * `config` - Cache configuration settings
    ///
    /// # Returns
    /// * `Ok(Self)` - Connected store that answered `PING`
    /// * `Err(DomainError::Configuration)` - The URL could not be parsed
    /// * `Err(DomainError::Storage)` - Redis is unreachable
    pub async fn connect(config: CacheConfig) -> DomainResult<Self> {
        Self::connect_with_clock(config, system_clock()).await
    }

    /// Connect reading time from `clock`
    pub async fn connect_with_clock(config: CacheConfig, clock: SharedClock) -> DomainResult<Self> {
        info!(url = %mask_url(&config.url), "Connecting revocation store to Redis");

        // Parse Redis URL and create client
        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection = with_timeout(
            "connect",
            Duration::from_secs(config.connection_timeout),
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|e| {
            error!(url = %mask_url(&config.url), error = %e, "Failed to connect to Redis");
            e
        })?;

        let store = Self {
            connection,
            config,
            clock,
        };
        store.health_check().await?;

        info!("Redis revocation store connected");
        Ok(store)
    }

    /// Check if the Redis connection is healthy
    ///
    /// Performs a `PING` command to verify connectivity.
    pub async fn health_check(&self) -> DomainResult<()> {
        let mut conn = self.connection.clone();
        let reply = with_timeout(
            "ping",
            self.response_timeout(),
            redis::cmd("PING").query_async::<_, String>(&mut conn),
        )
        .await?;

        if reply != "PONG" {
            return Err(StorageError::Unavailable {
                message: format!("unexpected PING reply '{}'", reply),
            }
            .into());
        }
        Ok(())
    }

    /// Key under which `id` is stored
    pub fn key_for(&self, id: &str) -> String {
        self.config.make_key(id)
    }

    fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.config.response_timeout)
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn add(&self, id: &str, expires_at: i64) -> DomainResult<()> {
        let ttl = expires_at - self.clock.now();
        if ttl <= 0 {
            debug!(id = %id, expires_at, "Skipping revocation of already expired token");
            return Ok(());
        }

        let key = self.key_for(id);
        let mut conn = self.connection.clone();
        with_timeout(
            "add",
            self.response_timeout(),
            conn.set_ex::<_, _, ()>(&key, "1", ttl as u64),
        )
        .await?;

        debug!(key = %key, ttl, "Revocation key set");
        Ok(())
    }

    async fn is_revoked(&self, id: &str) -> DomainResult<bool> {
        let key = self.key_for(id);
        let mut conn = self.connection.clone();
        let exists = with_timeout(
            "is_revoked",
            self.response_timeout(),
            conn.exists::<_, bool>(&key),
        )
        .await?;
        Ok(exists)
    }

    async fn sweep(&self) -> DomainResult<usize> {
        // Keys carry their own TTL
        Ok(0)
    }
}

/// Map a Redis failure onto the storage taxonomy
pub(crate) fn classify_redis_error(err: RedisError) -> DomainError {
    if err.is_timeout() {
        return StorageError::Timeout {
            operation: "redis command".to_string(),
            timeout_ms: 0,
        }
        .into();
    }
    if is_retriable_error(&err) || err.is_connection_dropped() || err.is_connection_refusal() {
        return StorageError::Unavailable {
            message: err.to_string(),
        }
        .into();
    }
    if err.kind() == redis::ErrorKind::InvalidClientConfig {
        return DomainError::configuration(err.to_string());
    }
    StorageError::Rejected {
        message: err.to_string(),
    }
    .into()
}

/// Check if a Redis error is retriable
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        redis::ErrorKind::IoError
            | redis::ErrorKind::ClientError
            | redis::ErrorKind::BusyLoadingError
            | redis::ErrorKind::TryAgain
    )
}

/// Mask sensitive parts of Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(proto_end) = url.find("://") {
            if proto_end < at_pos {
                let proto = &url[..proto_end + 3];
                let host_part = &url[at_pos..];
                return format!("{}****{}", proto, host_part);
            }
        }
    }
    url.to_string()
}

//! Memcached revocation store
//!
//! Revoked ids are `<prefix>:<id>` keys holding `"1"` with an expiration at
//! the token's own expiry, so Memcached drops them itself and sweeping is a
//! no-op. The `memcache` client is blocking; every call runs on the blocking
//! pool and is bounded by the configured timeouts.

use async_trait::async_trait;
use memcache::{Client, MemcacheError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use tg_core::domain::clock::{system_clock, SharedClock};
use tg_core::errors::{DomainError, DomainResult, StorageError};
use tg_core::repositories::RevocationStore;
use tg_shared::CacheConfig;

use super::redis_store::mask_url;
use crate::{with_timeout, InfrastructureError};

/// Relative expirations above 30 days are read by Memcached as Unix timestamps
const MAX_RELATIVE_EXPIRATION: i64 = 60 * 60 * 24 * 30;

/// Revocation store backed by Memcached key expiry
#[derive(Clone)]
pub struct MemcachedRevocationStore {
    client: Arc<Client>,
    config: CacheConfig,
    clock: SharedClock,
}

impl MemcachedRevocationStore {
    /// Connect using the system clock
    pub async fn connect(config: CacheConfig) -> DomainResult<Self> {
        Self::connect_with_clock(config, system_clock()).await
    }

    /// Connect reading time from `clock`
    ///
    /// # Returns
    /// * `Ok(Self)` - Connected store whose server answered `version`
    /// * `Err(DomainError::Configuration)` - The URL was rejected
    /// * `Err(DomainError::Storage)` - Memcached is unreachable
    pub async fn connect_with_clock(config: CacheConfig, clock: SharedClock) -> DomainResult<Self> {
        info!(url = %mask_url(&config.url), "Connecting revocation store to Memcached");

        let url = config.url.clone();
        let connect_timeout = Duration::from_secs(config.connection_timeout.max(1));
        let io_timeout = Duration::from_secs(config.response_timeout.max(1));

        let client = run_blocking("connect", connect_timeout * 2, move || {
            Client::builder()
                .add_server(url)?
                .with_connection_timeout(connect_timeout)
                .with_read_timeout(io_timeout)
                .with_write_timeout(io_timeout)
                .build()
        })
        .await
        .map_err(|e| {
            error!(url = %mask_url(&config.url), error = %e, "Failed to connect to Memcached");
            e
        })?;

        let store = Self {
            client: Arc::new(client),
            config,
            clock,
        };
        store.health_check().await?;

        info!("Memcached revocation store connected");
        Ok(store)
    }

    /// Ask every server for its version
    pub async fn health_check(&self) -> DomainResult<()> {
        let client = self.client.clone();
        run_blocking("version", self.response_timeout(), move || client.version()).await?;
        Ok(())
    }

    /// Key under which `id` is stored
    pub fn key_for(&self, id: &str) -> String {
        self.config.make_key(id)
    }

    fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.config.response_timeout.max(1))
    }
}

/// Expiration argument for a token expiring at `expires_at`, `ttl` seconds from now
fn expiration_for(expires_at: i64, ttl: i64) -> u32 {
    if ttl > MAX_RELATIVE_EXPIRATION {
        u32::try_from(expires_at).unwrap_or(u32::MAX)
    } else {
        ttl as u32
    }
}

async fn run_blocking<T, F>(
    operation: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, InfrastructureError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, MemcacheError> + Send + 'static,
{
    with_timeout(operation, timeout, async move {
        match tokio::task::spawn_blocking(call).await {
            Ok(result) => result.map_err(InfrastructureError::from),
            Err(join) => Err(InfrastructureError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                join,
            ))),
        }
    })
    .await
}

#[async_trait]
impl RevocationStore for MemcachedRevocationStore {
    fn backend_name(&self) -> &'static str {
        "memcached"
    }

    async fn add(&self, id: &str, expires_at: i64) -> DomainResult<()> {
        let ttl = expires_at - self.clock.now();
        if ttl <= 0 {
            debug!(id = %id, expires_at, "Skipping revocation of already expired token");
            return Ok(());
        }

        let key = self.key_for(id);
        let expiration = expiration_for(expires_at, ttl);
        let client = self.client.clone();
        let set_key = key.clone();
        run_blocking("add", self.response_timeout(), move || {
            client.set(&set_key, "1", expiration)
        })
        .await?;

        debug!(key = %key, ttl, "Revocation key set");
        Ok(())
    }

    async fn is_revoked(&self, id: &str) -> DomainResult<bool> {
        let key = self.key_for(id);
        let client = self.client.clone();
        let value = run_blocking("is_revoked", self.response_timeout(), move || {
            client.get::<String>(&key)
        })
        .await?;
        Ok(value.is_some())
    }

    async fn sweep(&self) -> DomainResult<usize> {
        // Keys carry their own expiration
        Ok(0)
    }
}

/// Map a Memcached failure onto the storage taxonomy
pub(crate) fn classify_memcache_error(err: MemcacheError) -> DomainError {
    match err {
        MemcacheError::BadURL(message) => {
            DomainError::configuration(format!("Invalid Memcached URL: {}", message))
        }
        MemcacheError::IOError(e) => StorageError::Unavailable {
            message: e.to_string(),
        }
        .into(),
        MemcacheError::PoolError(e) => StorageError::Unavailable {
            message: e.to_string(),
        }
        .into(),
        other => StorageError::Rejected {
            message: other.to_string(),
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_ttl_is_relative() {
        assert_eq!(expiration_for(1_700_003_600, 3600), 3600);
        assert_eq!(
            expiration_for(1_700_000_000 + MAX_RELATIVE_EXPIRATION, MAX_RELATIVE_EXPIRATION),
            MAX_RELATIVE_EXPIRATION as u32
        );
    }

    #[test]
    fn test_long_ttl_is_absolute() {
        let expires_at = 1_700_000_000 + MAX_RELATIVE_EXPIRATION + 1;
        assert_eq!(
            expiration_for(expires_at, MAX_RELATIVE_EXPIRATION + 1),
            expires_at as u32
        );
    }
}

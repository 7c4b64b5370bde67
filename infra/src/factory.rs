//! Revocation store factory
//!
//! Selects the backend named by `storage.type`, wraps it in a
//! [`RetryingStore`] when more than one attempt is configured, and wires the
//! gate, the sweep scheduler and the token service around it.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use tg_core::domain::clock::{system_clock, SharedClock};
use tg_core::errors::DomainResult;
use tg_core::repositories::{MemoryRevocationStore, RevocationStore};
use tg_core::services::{
    RetryConfig, RetryingStore, RevocationGate, SweepHandle, SweepScheduler, TokenService,
    TokenServiceConfig,
};
use tg_shared::{AdvancedConfig, AppConfig, JwtConfig, RevocationConfig, StorageType};

use crate::cache::RedisRevocationStore;
use crate::file::FileRevocationStore;

/// Build the configured store, retry wrapper included
pub async fn build_store(
    config: &RevocationConfig,
    clock: SharedClock,
) -> DomainResult<Arc<dyn RevocationStore>> {
    config.validate()?;

    let backend: Arc<dyn RevocationStore> = match config.storage.kind {
        StorageType::File => Arc::new(
            FileRevocationStore::open_with_clock(
                config.file_path(),
                config.file.gc_probability,
                clock,
            )
            .await?,
        ),
        StorageType::RemoteCache => {
            Arc::new(RedisRevocationStore::connect_with_clock(config.cache_config(), clock).await?)
        }
        StorageType::Database => build_database_store(config, clock).await?,
        StorageType::MemoryCache => build_memcached_store(config, clock).await?,
        StorageType::Memory => Arc::new(MemoryRevocationStore::with_clock(clock)),
    };

    if config.advanced.retry_attempts > 1 {
        let retry = RetryConfig::from(&config.advanced);
        info!(
            backend = backend.backend_name(),
            max_attempts = retry.max_attempts,
            delay_ms = retry.delay.as_millis() as u64,
            "Wrapping revocation store with retries"
        );
        Ok(Arc::new(RetryingStore::new(backend, retry)?))
    } else {
        Ok(backend)
    }
}

#[cfg(feature = "mysql")]
async fn build_database_store(
    config: &RevocationConfig,
    clock: SharedClock,
) -> DomainResult<Arc<dyn RevocationStore>> {
    let store =
        crate::database::MySqlRevocationStore::connect_with_clock(&config.database_config(), clock)
            .await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "mysql"))]
async fn build_database_store(
    _config: &RevocationConfig,
    _clock: SharedClock,
) -> DomainResult<Arc<dyn RevocationStore>> {
    Err(tg_core::errors::DomainError::configuration(
        "storage type 'database' requires the 'mysql' feature",
    ))
}

#[cfg(feature = "memcached")]
async fn build_memcached_store(
    config: &RevocationConfig,
    clock: SharedClock,
) -> DomainResult<Arc<dyn RevocationStore>> {
    let store =
        crate::cache::MemcachedRevocationStore::connect_with_clock(config.memcached_config(), clock)
            .await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "memcached"))]
async fn build_memcached_store(
    _config: &RevocationConfig,
    _clock: SharedClock,
) -> DomainResult<Arc<dyn RevocationStore>> {
    Err(tg_core::errors::DomainError::configuration(
        "storage type 'memory-cache' requires the 'memcached' feature",
    ))
}

/// Build a gate over the configured store
pub async fn build_gate(config: &RevocationConfig, clock: SharedClock) -> DomainResult<RevocationGate> {
    let store = build_store(config, clock).await?;
    Ok(RevocationGate::new(store))
}

/// Build a scheduler sweeping every `cleanup_interval_s`
pub fn build_sweep_scheduler(
    gate: RevocationGate,
    config: &AdvancedConfig,
    clock: SharedClock,
) -> SweepScheduler {
    SweepScheduler::new(gate, Duration::from_secs(config.cleanup_interval_s), clock)
}

/// Revocation services ready for use by the host
pub struct RevocationServices {
    /// Gate over the configured store
    pub gate: RevocationGate,
    /// Sweep trigger, also usable for request-path `maybe_sweep`
    pub scheduler: SweepScheduler,
    sweep_handle: Option<SweepHandle>,
}

impl RevocationServices {
    /// Whether the periodic sweep task was started
    pub fn is_sweeping(&self) -> bool {
        self.sweep_handle.is_some()
    }

    /// Token service consulting this gate
    pub fn token_service(&self, jwt: &JwtConfig) -> DomainResult<TokenService> {
        if jwt.is_using_default_secret() {
            warn!("Using default JWT secret. Set jwt.secret in production");
        }
        let config = TokenServiceConfig::from_jwt_config(jwt)?;
        TokenService::new(self.gate.clone(), config)
    }

    /// Stop the periodic sweep task, if running
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.sweep_handle.take() {
            handle.stop().await;
        }
        info!("Revocation services shut down");
    }
}

/// Initialize revocation services from application configuration
///
/// This function sets up:
/// - The configured revocation store, with retries when enabled
/// - The revocation gate
/// - The sweep scheduler, started when `advanced.auto_cleanup` is set
pub async fn initialize(config: &AppConfig) -> DomainResult<RevocationServices> {
    initialize_with_clock(config, system_clock()).await
}

/// Same as [`initialize`] with an explicit clock
pub async fn initialize_with_clock(
    config: &AppConfig,
    clock: SharedClock,
) -> DomainResult<RevocationServices> {
    info!(
        environment = %config.environment,
        storage = %config.revocation.storage.kind,
        "Initializing revocation services"
    );

    let gate = build_gate(&config.revocation, clock.clone()).await?;
    let scheduler = build_sweep_scheduler(gate.clone(), &config.revocation.advanced, clock);

    let sweep_handle = if config.revocation.advanced.auto_cleanup {
        Some(scheduler.start())
    } else {
        None
    };

    info!(backend = gate.backend_name(), "Revocation services initialized successfully");

    Ok(RevocationServices {
        gate,
        scheduler,
        sweep_handle,
    })
}

//! MySQL pool construction for the revocation table

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info};

use tg_shared::DatabaseConfig;

use crate::{with_timeout, InfrastructureError};

/// Owned SQLx pool sized from [`DatabaseConfig`]
#[derive(Clone)]
pub struct DatabasePool {
    pool: MySqlPool,
}

impl DatabasePool {
    /// Open the pool and establish the first connection
    ///
    /// An unreachable server fails here rather than on the first query.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, InfrastructureError> {
        let options = connect_options(config)?;
        info!(
            max_connections = config.max_connections,
            connect_timeout_s = config.connect_timeout,
            "Opening revocation database pool"
        );

        let pool = with_timeout(
            "connect",
            Duration::from_secs(config.connect_timeout.max(1)),
            pool_options(config).connect_with(options),
        )
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to open revocation database pool");
            e
        })?;

        Ok(Self { pool })
    }

    /// Build the pool without connecting; connections open on first query
    pub fn new_lazy(config: &DatabaseConfig) -> Result<Self, InfrastructureError> {
        let pool = pool_options(config).connect_lazy_with(connect_options(config)?);
        Ok(Self { pool })
    }

    /// Hand the SQLx pool to a store
    pub fn into_inner(self) -> MySqlPool {
        self.pool
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<MySqlConnectOptions, InfrastructureError> {
    MySqlConnectOptions::from_str(&config.url)
        .map_err(|e| InfrastructureError::Config(format!("Invalid database URL: {}", e)))
}

fn pool_options(config: &DatabaseConfig) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .idle_timeout(Duration::from_secs(600))
        .test_before_acquire(true)
}

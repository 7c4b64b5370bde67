//! MySQL implementation of the RevocationStore trait.
//!
//! Revoked ids are rows of a single table with an indexed `expires_at`
//! column. The table is created at construction if it does not exist.

use async_trait::async_trait;
use sqlx::MySqlPool;
use std::time::Duration;
use tracing::{debug, info};

use tg_core::domain::clock::{system_clock, SharedClock};
use tg_core::errors::{DomainError, DomainResult};
use tg_core::repositories::RevocationStore;
use tg_shared::config::is_valid_table_name;
use tg_shared::DatabaseConfig;

use crate::database::connection::DatabasePool;
use crate::with_timeout;

/// MySQL implementation of RevocationStore
pub struct MySqlRevocationStore {
    /// Database connection pool
    pool: MySqlPool,
    table: String,
    statement_timeout: Duration,
    clock: SharedClock,
    insert_sql: String,
    select_sql: String,
    delete_sql: String,
}

impl MySqlRevocationStore {
    /// Connect, create the table if needed and return a ready store
    pub async fn connect(config: &DatabaseConfig) -> DomainResult<Self> {
        Self::connect_with_clock(config, system_clock()).await
    }

    /// Same as [`connect`](Self::connect) but reading time from `clock`
    pub async fn connect_with_clock(config: &DatabaseConfig, clock: SharedClock) -> DomainResult<Self> {
        ensure_valid_table(&config.table_name)?;
        let pool = DatabasePool::new(config).await?;

        Self::with_pool(
            pool.into_inner(),
            &config.table_name,
            Duration::from_secs(config.statement_timeout),
            clock,
        )
        .await
    }

    /// Build a store on an existing pool
    ///
    /// # Arguments
    /// * `pool` - MySQL connection pool from SQLx
    /// * `table` - Table name, must match `^[A-Za-z_][A-Za-z0-9_]{0,63}$`
    /// * `statement_timeout` - Upper bound for every statement
    /// * `clock` - Time source for expiry comparisons
    pub async fn with_pool(
        pool: MySqlPool,
        table: &str,
        statement_timeout: Duration,
        clock: SharedClock,
    ) -> DomainResult<Self> {
        ensure_valid_table(table)?;

        let store = Self {
            pool,
            table: table.to_string(),
            statement_timeout,
            clock,
            insert_sql: format!(
                "INSERT INTO {} (id, expires_at, created_at) VALUES (?, ?, ?) \
                 ON DUPLICATE KEY UPDATE expires_at = VALUES(expires_at), created_at = VALUES(created_at)",
                table
            ),
            select_sql: format!(
                "SELECT 1 FROM {} WHERE id = ? AND expires_at > ? LIMIT 1",
                table
            ),
            delete_sql: format!("DELETE FROM {} WHERE expires_at <= ?", table),
        };
        store.ensure_table().await?;

        info!(table = %store.table, "MySQL revocation store ready");
        Ok(store)
    }

    /// Table holding the revoked ids
    pub fn table(&self) -> &str {
        &self.table
    }

    async fn ensure_table(&self) -> DomainResult<()> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
                id VARCHAR(128) NOT NULL PRIMARY KEY, \
                expires_at BIGINT NOT NULL, \
                created_at BIGINT NOT NULL, \
                INDEX idx_expires_at (expires_at)\
            )",
            self.table
        );

        with_timeout(
            "create_table",
            self.statement_timeout,
            sqlx::query(&ddl).execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

fn ensure_valid_table(table: &str) -> DomainResult<()> {
    if is_valid_table_name(table) {
        Ok(())
    } else {
        Err(DomainError::configuration(format!(
            "'{}' is not a valid table name",
            table
        )))
    }
}

#[async_trait]
impl RevocationStore for MySqlRevocationStore {
    fn backend_name(&self) -> &'static str {
        "mysql"
    }

    async fn add(&self, id: &str, expires_at: i64) -> DomainResult<()> {
        let now = self.clock.now();
        if expires_at <= now {
            debug!(id = %id, expires_at, "Skipping revocation of already expired token");
            return Ok(());
        }

        with_timeout(
            "add",
            self.statement_timeout,
            sqlx::query(&self.insert_sql)
                .bind(id)
                .bind(expires_at)
                .bind(now)
                .execute(&self.pool),
        )
        .await?;

        debug!(id = %id, expires_at, "Revocation row upserted");
        Ok(())
    }

    async fn is_revoked(&self, id: &str) -> DomainResult<bool> {
        let row = with_timeout(
            "is_revoked",
            self.statement_timeout,
            sqlx::query(&self.select_sql)
                .bind(id)
                .bind(self.clock.now())
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.is_some())
    }

    async fn sweep(&self) -> DomainResult<usize> {
        let result = with_timeout(
            "sweep",
            self.statement_timeout,
            sqlx::query(&self.delete_sql)
                .bind(self.clock.now())
                .execute(&self.pool),
        )
        .await?;

        let removed = result.rows_affected() as usize;
        info!(table = %self.table, removed, "MySQL revocation sweep completed");
        Ok(removed)
    }
}

//! Unit tests for database connection pool and store construction

use std::sync::Arc;
use std::time::Duration;

use tg_core::domain::clock::ManualClock;
use tg_core::errors::DomainError;
use tg_shared::DatabaseConfig;

use crate::database::connection::DatabasePool;
use crate::database::MySqlRevocationStore;

#[tokio::test]
async fn test_pool_creation_with_invalid_url() {
    let config = DatabaseConfig::new("not a url");

    let result = DatabasePool::new(&config).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_invalid_table_name_rejected_before_connecting() {
    let config = DatabaseConfig::new("mysql://root@127.0.0.1:1/tokens")
        .with_table_name("tokens; DROP TABLE users");

    let result = MySqlRevocationStore::connect(&config).await;
    assert!(matches!(result, Err(DomainError::Configuration { .. })));
}

#[tokio::test]
async fn test_with_pool_validates_table_name() {
    let pool = DatabasePool::new_lazy(&DatabaseConfig::new("mysql://root@127.0.0.1:1/tokens"))
        .unwrap()
        .into_inner();

    let result = MySqlRevocationStore::with_pool(
        pool,
        "1starts_with_digit",
        Duration::from_secs(1),
        Arc::new(ManualClock::new(0)),
    )
    .await;
    assert!(matches!(result, Err(DomainError::Configuration { .. })));
}

#[test]
fn test_lazy_pool_rejects_malformed_url() {
    let result = DatabasePool::new_lazy(&DatabaseConfig::new("not a url"));
    assert!(matches!(result, Err(crate::InfrastructureError::Config(_))));
}

//! Unit tests for the Redis store helpers
//!
//! Tests that need a live server are in `tests/redis_integration.rs`.

use redis::{ErrorKind, RedisError};

use tg_core::errors::{DomainError, StorageError};

use crate::cache::redis_store::{classify_redis_error, is_retriable_error, mask_url};
use crate::cache::{CacheConfig, RedisRevocationStore};

#[test]
fn test_mask_url_hides_credentials() {
    assert_eq!(
        mask_url("redis://:secret@cache.internal:6379/0"),
        "redis://****@cache.internal:6379/0"
    );
    assert_eq!(
        mask_url("redis://user:p@ss@cache:6379"),
        "redis://****@cache:6379"
    );
    assert_eq!(mask_url("redis://localhost:6379"), "redis://localhost:6379");
}

#[test]
fn test_io_errors_are_unavailable() {
    let err = RedisError::from((ErrorKind::IoError, "connection reset"));
    assert!(is_retriable_error(&err));

    let err = classify_redis_error(err);
    assert!(matches!(err, DomainError::Storage(StorageError::Unavailable { .. })));
    assert!(err.is_transient());
}

#[test]
fn test_command_errors_are_rejected() {
    let err = RedisError::from((ErrorKind::TypeError, "WRONGTYPE"));
    assert!(!is_retriable_error(&err));

    let err = classify_redis_error(err);
    assert!(matches!(err, DomainError::Storage(StorageError::Rejected { .. })));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_invalid_url_is_a_configuration_error() {
    let result = RedisRevocationStore::connect(CacheConfig::new("not a redis url")).await;
    assert!(matches!(result, Err(DomainError::Configuration { .. })));
}

#[tokio::test]
async fn test_unreachable_server_fails_construction() {
    let config = CacheConfig::new("redis://127.0.0.1:1/0").with_timeouts(1, 1);
    let result = RedisRevocationStore::connect(config).await;

    match result {
        Err(DomainError::Storage(err)) => assert!(err.is_transient()),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("connected to a closed port"),
    }
}

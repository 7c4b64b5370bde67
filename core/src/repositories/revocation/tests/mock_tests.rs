//! Unit tests for the scripted mock store

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::domain::clock::ManualClock;
use crate::errors::{DomainError, StorageError};
use crate::repositories::revocation::{MockRevocationStore, RevocationStore};

#[tokio::test]
async fn test_mock_fails_scripted_number_of_times() {
    let store = MockRevocationStore::new(Arc::new(ManualClock::new(0))).failing_times(2);

    assert!(store.add("a", 100).await.is_err());
    assert!(store.add("a", 100).await.is_err());
    assert!(store.add("a", 100).await.is_ok());
    assert!(store.is_revoked("a").await.unwrap());
    assert_eq!(store.add_calls.load(Ordering::SeqCst), 3);
    assert_eq!(store.total_calls(), 4);
}

#[tokio::test]
async fn test_mock_rejecting_is_not_transient() {
    let store = MockRevocationStore::new(Arc::new(ManualClock::new(0))).rejecting();

    let err = store.sweep().await.unwrap_err();
    assert!(matches!(err, DomainError::Storage(StorageError::Rejected { .. })));
    assert!(!err.is_transient());
}

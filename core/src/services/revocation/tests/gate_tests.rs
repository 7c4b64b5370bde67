//! Unit tests for the revocation gate

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::domain::clock::ManualClock;
use crate::errors::{DomainError, RevocationError, StorageError};
use crate::repositories::revocation::{MemoryRevocationStore, MockRevocationStore};
use crate::services::revocation::RevocationGate;

const T0: i64 = 1_700_000_000;

#[tokio::test]
async fn test_revoke_and_check() {
    let clock = Arc::new(ManualClock::new(T0));
    let gate = RevocationGate::new(Arc::new(MemoryRevocationStore::with_clock(clock.clone())));

    gate.revoke("abc123", T0 + 3600).await.unwrap();
    assert!(gate.is_revoked("abc123").await.unwrap());
    assert_eq!(gate.backend_name(), "memory");

    clock.advance(3601);
    assert!(!gate.is_revoked("abc123").await.unwrap());
    assert_eq!(gate.sweep().await.unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_ids_never_reach_the_store() {
    let store = Arc::new(MockRevocationStore::new(Arc::new(ManualClock::new(T0))));
    let gate = RevocationGate::new(store.clone());

    let err = gate.revoke("", T0 + 10).await.unwrap_err();
    assert!(matches!(err, DomainError::Revocation(RevocationError::MissingTokenId)));

    let err = gate.is_revoked("../../etc/passwd").await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Revocation(RevocationError::InvalidTokenId { .. })
    ));

    assert_eq!(store.total_calls(), 0);
}

#[tokio::test]
async fn test_store_errors_propagate() {
    let store = Arc::new(MockRevocationStore::new(Arc::new(ManualClock::new(T0))).always_failing());
    let gate = RevocationGate::new(store.clone());

    let err = gate.is_revoked("abc123").await.unwrap_err();
    assert!(matches!(err, DomainError::Storage(StorageError::Unavailable { .. })));

    assert!(gate.revoke("abc123", T0 + 10).await.is_err());
    assert_eq!(store.check_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.add_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_gate_clones_share_the_store() {
    let gate = RevocationGate::new(Arc::new(MemoryRevocationStore::with_clock(Arc::new(
        ManualClock::new(T0),
    ))));
    let other = gate.clone();

    gate.revoke("shared-id", T0 + 60).await.unwrap();
    assert!(other.is_revoked("shared-id").await.unwrap());
}

//! Unit tests for the file-backed revocation store

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tg_core::domain::clock::ManualClock;
use tg_core::domain::entities::RevocationEntry;
use tg_core::errors::{DomainError, RevocationError, StorageError};
use tg_core::repositories::RevocationStore;

use crate::file::FileRevocationStore;

const T0: i64 = 1_700_000_000;

async fn open_store(dir: &Path, clock: &Arc<ManualClock>) -> FileRevocationStore {
    FileRevocationStore::open_with_clock(dir, 0.0, clock.clone())
        .await
        .unwrap()
}

fn record_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn read_entry(path: &Path) -> RevocationEntry {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

async fn wait_until_removed(path: &Path) -> bool {
    for _ in 0..100 {
        if !path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_add_writes_json_record() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(dir.path(), &clock).await;

    store.add("abc123", T0 + 3600).await.unwrap();

    assert_eq!(record_files(dir.path()), vec!["abc123.json".to_string()]);
    let entry = read_entry(&dir.path().join("abc123.json"));
    assert_eq!(entry, RevocationEntry::new("abc123", T0 + 3600, T0));
    assert!(store.is_revoked("abc123").await.unwrap());
    assert!(!store.is_revoked("unknown").await.unwrap());
}

#[tokio::test]
async fn test_expired_scenario_then_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(dir.path(), &clock).await;

    store.add("abc123", T0 + 3600).await.unwrap();
    assert!(store.is_revoked("abc123").await.unwrap());

    clock.advance(3601);
    assert_eq!(store.sweep().await.unwrap(), 1);
    assert!(record_files(dir.path()).is_empty());
    assert!(!store.is_revoked("abc123").await.unwrap());
}

#[tokio::test]
async fn test_past_expiry_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(dir.path(), &clock).await;

    store.add("x", T0 - 10).await.unwrap();
    store.add("y", T0).await.unwrap();

    assert!(record_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_readd_overwrites_with_latest_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(dir.path(), &clock).await;

    store.add("abc123", T0 + 3600).await.unwrap();
    store.add("abc123", T0 + 60).await.unwrap();

    assert_eq!(record_files(dir.path()).len(), 1);
    assert_eq!(read_entry(&dir.path().join("abc123.json")).expires_at, T0 + 60);
}

#[tokio::test]
async fn test_expired_record_is_absent_and_removed_in_background() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(dir.path(), &clock).await;

    store.add("abc123", T0 + 10).await.unwrap();
    clock.advance(11);

    assert!(!store.is_revoked("abc123").await.unwrap());
    assert!(wait_until_removed(&dir.path().join("abc123.json")).await);
}

#[tokio::test]
async fn test_malformed_record_reads_as_absent_and_survives_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(dir.path(), &clock).await;

    std::fs::write(dir.path().join("broken.json"), b"{not json").unwrap();

    assert!(!store.is_revoked("broken").await.unwrap());
    assert_eq!(store.stats().await.unwrap().malformed_files, 1);
    assert_eq!(store.sweep().await.unwrap(), 0);
    assert_eq!(record_files(dir.path()), vec!["broken.json".to_string()]);
}

#[tokio::test]
async fn test_sweep_keeps_unparsable_record_with_future_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(dir.path(), &clock).await;

    let body = format!(r#"{{"id":"live","expires_at":{}}}"#, T0 + 3600);
    std::fs::write(dir.path().join("live.json"), body).unwrap();
    store.add("gone", T0 + 10).await.unwrap();
    clock.advance(20);

    assert_eq!(store.sweep().await.unwrap(), 1);
    assert_eq!(record_files(dir.path()), vec!["live.json".to_string()]);
}

#[tokio::test]
async fn test_ids_outside_the_directory_are_rejected() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("store");
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(&dir, &clock).await;

    let outside = root.path().join("victim.json");
    let expired = RevocationEntry::new("victim", T0 - 5, T0 - 10);
    std::fs::write(&outside, serde_json::to_vec(&expired).unwrap()).unwrap();

    let err = store.is_revoked("../victim").await.unwrap_err();
    assert!(matches!(err, DomainError::Revocation(RevocationError::InvalidTokenId { .. })));
    let err = store.add("../victim", T0 + 60).await.unwrap_err();
    assert!(matches!(err, DomainError::Revocation(RevocationError::InvalidTokenId { .. })));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(outside.exists());
}

#[tokio::test]
async fn test_write_into_removed_directory_is_not_transient() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("store");
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(&dir, &clock).await;

    std::fs::remove_dir_all(&dir).unwrap();

    let err = store.add("abc123", T0 + 60).await.unwrap_err();
    assert!(matches!(err, DomainError::Storage(StorageError::Rejected { .. })));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_sweep_keeps_live_records() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(dir.path(), &clock).await;

    store.add("short-1", T0 + 10).await.unwrap();
    store.add("short-2", T0 + 20).await.unwrap();
    store.add("long", T0 + 3600).await.unwrap();
    clock.advance(30);

    assert_eq!(store.sweep().await.unwrap(), 2);
    assert_eq!(record_files(dir.path()), vec!["long.json".to_string()]);

    // Nothing more to remove until time moves on
    assert_eq!(store.sweep().await.unwrap(), 0);
}

#[tokio::test]
async fn test_stats() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(dir.path(), &clock).await;

    store.add("a", T0 + 10).await.unwrap();
    store.add("b", T0 + 3600).await.unwrap();
    store.add("c", T0 + 3600).await.unwrap();
    clock.advance(20);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.live_entries, 2);
    assert_eq!(stats.expired_entries, 1);
    assert_eq!(stats.malformed_files, 0);
    assert_eq!(stats.path, dir.path());
}

#[tokio::test]
async fn test_gc_probability_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let store = FileRevocationStore::open_with_clock(dir.path(), 1.5, clock)
        .await
        .unwrap();
    assert_eq!(store.gc_probability(), 1.0);

    store.set_gc_probability(-0.3);
    assert_eq!(store.gc_probability(), 0.0);

    store.set_gc_probability(0.25);
    assert_eq!(store.gc_probability(), 0.25);
}

#[tokio::test]
async fn test_add_triggers_background_sweep_when_probability_is_one() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(dir.path(), &clock).await;

    store.add("old", T0 + 10).await.unwrap();
    clock.advance(60);

    store.set_gc_probability(1.0);
    store.add("new", T0 + 3600).await.unwrap();

    assert!(wait_until_removed(&dir.path().join("old.json")).await);
    assert!(dir.path().join("new.json").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_converge_on_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));
    let store = open_store(dir.path(), &clock).await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.add("shared", T0 + 100 + i).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(record_files(dir.path()), vec!["shared.json".to_string()]);
    let entry = read_entry(&dir.path().join("shared.json"));
    assert!(entry.expires_at >= T0 + 100 && entry.expires_at < T0 + 116);
}

#[tokio::test]
async fn test_open_fails_when_path_is_a_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let clock = Arc::new(ManualClock::new(T0));

    let result = FileRevocationStore::open_with_clock(file.path(), 0.1, clock).await;
    assert!(matches!(
        result,
        Err(DomainError::Storage(StorageError::Unavailable { .. }))
    ));
}

#[tokio::test]
async fn test_open_creates_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let clock = Arc::new(ManualClock::new(T0));

    let store = FileRevocationStore::open_with_clock(&nested, 0.1, clock)
        .await
        .unwrap();
    assert!(nested.is_dir());
    assert_eq!(store.path(), nested.as_path());
    assert!(record_files(&nested).is_empty());
}

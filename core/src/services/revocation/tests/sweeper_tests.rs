//! Unit tests for sweep scheduling

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::clock::ManualClock;
use crate::repositories::revocation::MockRevocationStore;
use crate::services::revocation::{RevocationGate, SweepScheduler};

const T0: i64 = 1_700_000_000;

fn scheduler_with(
    store: Arc<MockRevocationStore>,
    clock: Arc<ManualClock>,
    interval: Duration,
) -> SweepScheduler {
    SweepScheduler::new(RevocationGate::new(store), interval, clock)
}

#[tokio::test]
async fn test_maybe_sweep_is_rate_limited() {
    let clock = Arc::new(ManualClock::new(T0));
    let store = Arc::new(MockRevocationStore::new(clock.clone()));
    let scheduler = scheduler_with(store.clone(), clock.clone(), Duration::from_secs(60));

    assert!(scheduler.last_sweep_at().is_none());
    let report = scheduler.maybe_sweep().await.expect("first call sweeps");
    assert!(report.is_success());
    assert_eq!(report.started_at, T0);

    clock.advance(30);
    assert!(scheduler.maybe_sweep().await.is_none());
    assert_eq!(store.sweep_calls.load(Ordering::SeqCst), 1);

    clock.advance(30);
    assert!(scheduler.maybe_sweep().await.is_some());
    assert_eq!(store.sweep_calls.load(Ordering::SeqCst), 2);
    assert_eq!(scheduler.last_sweep_at(), Some(T0 + 60));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_sweep_once_per_slot() {
    let clock = Arc::new(ManualClock::new(T0));
    let store = Arc::new(MockRevocationStore::new(clock.clone()));
    let scheduler = scheduler_with(store.clone(), clock, Duration::from_secs(3600));

    let mut handles = Vec::new();
    for _ in 0..32 {
        let scheduler = scheduler.clone();
        handles.push(tokio::spawn(async move { scheduler.maybe_sweep().await }));
    }

    let mut swept = 0;
    for handle in handles {
        if handle.await.unwrap().is_some() {
            swept += 1;
        }
    }

    assert_eq!(swept, 1);
    assert_eq!(store.sweep_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sweep_errors_are_reported() {
    let clock = Arc::new(ManualClock::new(T0));
    let store = Arc::new(MockRevocationStore::new(clock.clone()).always_failing());
    let scheduler = scheduler_with(store, clock, Duration::from_secs(60));

    let report = scheduler.run_once().await;
    assert!(!report.is_success());
    assert_eq!(report.removed, 0);
    assert!(report.error.unwrap().contains("connection refused"));
    assert_eq!(scheduler.last_sweep_at(), Some(T0));
}

#[tokio::test]
async fn test_run_once_counts_removed_entries() {
    let clock = Arc::new(ManualClock::new(T0));
    let store = Arc::new(MockRevocationStore::new(clock.clone()));
    let gate = RevocationGate::new(store);
    gate.revoke("a", T0 + 10).await.unwrap();
    gate.revoke("b", T0 + 10).await.unwrap();
    gate.revoke("c", T0 + 1000).await.unwrap();

    let scheduler = SweepScheduler::new(gate, Duration::from_secs(60), clock.clone());
    clock.advance(11);

    assert_eq!(scheduler.run_once().await.removed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_start_and_stop_lifecycle() {
    let clock = Arc::new(ManualClock::new(T0));
    let store = Arc::new(MockRevocationStore::new(clock.clone()));
    let scheduler = scheduler_with(store.clone(), clock, Duration::from_secs(60));

    let handle = scheduler.start();
    tokio::time::sleep(Duration::from_secs(125)).await;
    assert_eq!(store.sweep_calls.load(Ordering::SeqCst), 2);
    assert!(!handle.is_finished());

    handle.stop().await;
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(store.sweep_calls.load(Ordering::SeqCst), 2);
}

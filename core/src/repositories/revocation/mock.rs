//! Mock implementation of RevocationStore for testing
//!
//! Delegates to a [`MemoryRevocationStore`] and can be scripted to fail a
//! number of times before succeeding, or to fail permanently.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::domain::clock::SharedClock;
use crate::errors::{DomainError, DomainResult, StorageError};

use super::memory::MemoryRevocationStore;
use super::r#trait::RevocationStore;

/// Error produced by a scripted failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    Unavailable,
    Rejected,
    Configuration,
}

/// Mock revocation store with scripted failures and call counters
pub struct MockRevocationStore {
    entries: MemoryRevocationStore,
    failures_remaining: AtomicU32,
    always_fail: AtomicBool,
    failure: FailureKind,
    pub add_calls: AtomicU32,
    pub check_calls: AtomicU32,
    pub sweep_calls: AtomicU32,
}

impl MockRevocationStore {
    /// Create a mock that never fails
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: MemoryRevocationStore::with_clock(clock),
            failures_remaining: AtomicU32::new(0),
            always_fail: AtomicBool::new(false),
            failure: FailureKind::Unavailable,
            add_calls: AtomicU32::new(0),
            check_calls: AtomicU32::new(0),
            sweep_calls: AtomicU32::new(0),
        }
    }

    /// Fail the next `count` calls with a transient error
    pub fn failing_times(self, count: u32) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Fail every call with a transient error
    pub fn always_failing(self) -> Self {
        self.always_fail.store(true, Ordering::SeqCst);
        self
    }

    /// Fail every call with a non-transient error
    pub fn rejecting(mut self) -> Self {
        self.always_fail.store(true, Ordering::SeqCst);
        self.failure = FailureKind::Rejected;
        self
    }

    /// Fail every call with a configuration error
    pub fn misconfigured(mut self) -> Self {
        self.always_fail.store(true, Ordering::SeqCst);
        self.failure = FailureKind::Configuration;
        self
    }

    /// Total calls across all operations
    pub fn total_calls(&self) -> u32 {
        self.add_calls.load(Ordering::SeqCst)
            + self.check_calls.load(Ordering::SeqCst)
            + self.sweep_calls.load(Ordering::SeqCst)
    }

    fn maybe_fail(&self) -> DomainResult<()> {
        let scripted = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if scripted || self.always_fail.load(Ordering::SeqCst) {
            return Err(match self.failure {
                FailureKind::Unavailable => StorageError::Unavailable {
                    message: "connection refused".to_string(),
                }
                .into(),
                FailureKind::Rejected => StorageError::Rejected {
                    message: "WRONGTYPE".to_string(),
                }
                .into(),
                FailureKind::Configuration => {
                    DomainError::configuration("revocation table is not writable")
                }
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RevocationStore for MockRevocationStore {
    fn backend_name(&self) -> &'static str {
        "mock"
    }

    async fn add(&self, id: &str, expires_at: i64) -> DomainResult<()> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;
        self.entries.add(id, expires_at).await
    }

    async fn is_revoked(&self, id: &str) -> DomainResult<bool> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;
        self.entries.is_revoked(id).await
    }

    async fn sweep(&self) -> DomainResult<usize> {
        self.sweep_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;
        self.entries.sweep().await
    }
}

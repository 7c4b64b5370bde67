//! In-process revocation store
//!
//! Entries live in a map guarded by a `tokio` read/write lock and are lost on
//! restart. Serves the `memory` storage type and single-process
//! deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::clock::{system_clock, SharedClock};
use crate::domain::entities::revocation::RevocationEntry;
use crate::errors::DomainResult;

use super::r#trait::RevocationStore;

/// Revocation store backed by a `HashMap`
#[derive(Debug, Clone)]
pub struct MemoryRevocationStore {
    entries: Arc<RwLock<HashMap<String, RevocationEntry>>>,
    clock: SharedClock,
}

impl MemoryRevocationStore {
    /// Create an empty store using the system clock
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    /// Create an empty store reading time from `clock`
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the map holds no entries at all
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryRevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn add(&self, id: &str, expires_at: i64) -> DomainResult<()> {
        let now = self.clock.now();
        if expires_at <= now {
            debug!(id = %id, expires_at, "Skipping revocation of already expired token");
            return Ok(());
        }

        let mut entries = self.entries.write().await;
        entries.insert(id.to_string(), RevocationEntry::new(id, expires_at, now));
        Ok(())
    }

    async fn is_revoked(&self, id: &str) -> DomainResult<bool> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        Ok(entries.get(id).map_or(false, |entry| entry.is_live_at(now)))
    }

    async fn sweep(&self) -> DomainResult<usize> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live_at(now));
        let removed = before - entries.len();

        debug!(removed, remaining = entries.len(), "Swept in-memory revocation entries");
        Ok(removed)
    }
}

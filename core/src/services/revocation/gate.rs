//! Revocation gate consulted by token validation

use std::sync::Arc;
use tracing::debug;

use crate::domain::entities::revocation::validate_token_id;
use crate::errors::DomainResult;
use crate::repositories::RevocationStore;

/// Single entry point for revoking and checking token ids
///
/// Ids are validated before any backend sees them. Store errors propagate
/// unchanged; deciding whether an unreachable store means "revoked" is the
/// caller's job.
#[derive(Clone)]
pub struct RevocationGate {
    store: Arc<dyn RevocationStore>,
}

impl RevocationGate {
    /// Create a gate over an already constructed store
    pub fn new(store: Arc<dyn RevocationStore>) -> Self {
        Self { store }
    }

    /// Name of the backend behind the gate
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Revoke `id` until `expires_at`
    pub async fn revoke(&self, id: &str, expires_at: i64) -> DomainResult<()> {
        validate_token_id(id)?;
        self.store.add(id, expires_at).await?;

        debug!(backend = self.store.backend_name(), id = %id, expires_at, "Token revoked");
        Ok(())
    }

    /// Whether `id` is currently revoked
    pub async fn is_revoked(&self, id: &str) -> DomainResult<bool> {
        validate_token_id(id)?;
        self.store.is_revoked(id).await
    }

    /// Remove expired entries from the store
    pub async fn sweep(&self) -> DomainResult<usize> {
        self.store.sweep().await
    }
}

impl std::fmt::Debug for RevocationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationGate")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

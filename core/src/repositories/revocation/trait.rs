//! Revocation store trait defining the contract every backend implements.

use async_trait::async_trait;

use crate::errors::DomainResult;

/// Persistence contract for revoked token ids
///
/// An entry whose `expires_at` is not in the future is semantically absent,
/// whether or not the backend has physically removed it yet.
///
/// # Concurrency
/// Every operation takes `&self` and may be called concurrently. Repeated
/// adds for the same id converge on the last submitted expiry.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Short backend name used in logs (`file`, `redis`, `mysql`, `memory`)
    fn backend_name(&self) -> &'static str;

    /// Record `id` as revoked until `expires_at`
    ///
    /// # Arguments
    /// * `id` - Token identifier, already validated by the gate
    /// * `expires_at` - Absolute Unix timestamp in seconds
    ///
    /// # Returns
    /// * `Ok(())` - Entry stored, or `expires_at` already passed and nothing was written
    /// * `Err(DomainError::Storage)` - The backend could not persist the entry
    async fn add(&self, id: &str, expires_at: i64) -> DomainResult<()>;

    /// Whether a live entry exists for `id`
    ///
    /// # Returns
    /// * `Ok(true)` - A live entry exists
    /// * `Ok(false)` - No entry, or the entry has expired
    /// * `Err(DomainError::Storage)` - The backend could not be consulted
    async fn is_revoked(&self, id: &str) -> DomainResult<bool>;

    /// Remove expired entries
    ///
    /// # Returns
    /// * `Ok(count)` - Best-effort number of removed entries; native-TTL backends return 0
    /// * `Err(DomainError::Storage)` - The sweep could not run
    async fn sweep(&self) -> DomainResult<usize>;
}

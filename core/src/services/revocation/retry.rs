//! Retry decorator for revocation stores

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use tg_shared::AdvancedConfig;

use crate::errors::{DomainError, DomainResult, StorageError};
use crate::repositories::RevocationStore;

/// Retry policy: fixed delay, bounded attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts per operation, including the first one
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(100),
        }
    }
}

impl RetryConfig {
    /// Create a new retry policy
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Reject a policy that would never call the store
    pub fn validate(&self) -> DomainResult<()> {
        if self.max_attempts == 0 {
            return Err(DomainError::configuration(
                "retry max_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

impl From<&AdvancedConfig> for RetryConfig {
    fn from(config: &AdvancedConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
    }
}

/// Store decorator that retries transient failures
///
/// Non-transient errors (configuration, invalid id, malformed record,
/// rejected command) are returned on the first occurrence. After
/// `max_attempts` transient failures the last error is wrapped in
/// [`StorageError::RetriesExhausted`].
pub struct RetryingStore {
    inner: Arc<dyn RevocationStore>,
    config: RetryConfig,
}

impl RetryingStore {
    /// Wrap `inner` with the given retry policy
    pub fn new(inner: Arc<dyn RevocationStore>, config: RetryConfig) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self { inner, config })
    }

    /// The retry policy in effect
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    async fn run<T, F, Fut>(&self, operation: &'static str, mut call: F) -> DomainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(
                            backend = self.inner.backend_name(),
                            operation,
                            attempt,
                            "Revocation store operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(DomainError::Storage(err)) if err.is_transient() => {
                    if attempt >= self.config.max_attempts {
                        error!(
                            backend = self.inner.backend_name(),
                            operation,
                            attempts = attempt,
                            error = %err,
                            "Revocation store operation failed, giving up"
                        );
                        return Err(StorageError::RetriesExhausted {
                            operation: operation.to_string(),
                            attempts: attempt,
                            source: Box::new(err),
                        }
                        .into());
                    }

                    warn!(
                        backend = self.inner.backend_name(),
                        operation,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        error = %err,
                        "Revocation store operation failed, retrying"
                    );
                    tokio::time::sleep(self.config.delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl RevocationStore for RetryingStore {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn add(&self, id: &str, expires_at: i64) -> DomainResult<()> {
        self.run("add", move || self.inner.add(id, expires_at)).await
    }

    async fn is_revoked(&self, id: &str) -> DomainResult<bool> {
        self.run("is_revoked", move || self.inner.is_revoked(id)).await
    }

    async fn sweep(&self) -> DomainResult<usize> {
        self.run("sweep", move || self.inner.sweep()).await
    }
}

//! File-backed revocation store
//!
//! Each revoked id is a `<dir>/<id>.json` record holding a serialized
//! [`RevocationEntry`]. Writes go to a temporary file that is renamed over the
//! record, so readers only ever see complete records. Expired records are
//! removed lazily on read, by probabilistic background sweeps after adds, and
//! by explicit sweeps.

use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tg_core::domain::clock::{system_clock, SharedClock};
use tg_core::domain::entities::{validate_token_id, RevocationEntry};
use tg_core::errors::{DomainResult, StorageError};
use tg_core::repositories::RevocationStore;

use crate::InfrastructureError;

const RECORD_EXTENSION: &str = "json";

/// Snapshot of the store directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStoreStats {
    /// Record files found
    pub total_files: usize,
    /// Records that still revoke their token
    pub live_entries: usize,
    /// Records past their expiry awaiting removal
    pub expired_entries: usize,
    /// Records that could not be parsed
    pub malformed_files: usize,
    /// Store directory
    pub path: PathBuf,
}

struct Inner {
    dir: PathBuf,
    clock: SharedClock,
    gc_probability: AtomicU64,
    write_lock: Mutex<()>,
    sweep_in_flight: AtomicBool,
}

/// Revocation store keeping one JSON file per revoked id
#[derive(Clone)]
pub struct FileRevocationStore {
    inner: Arc<Inner>,
}

impl FileRevocationStore {
    /// Open (and create if needed) a store in `dir` using the system clock
    pub async fn open(dir: impl Into<PathBuf>, gc_probability: f64) -> DomainResult<Self> {
        Self::open_with_clock(dir, gc_probability, system_clock()).await
    }

    /// Open a store reading time from `clock`
    ///
    /// Fails with `StorageError::Unavailable` if the directory cannot be
    /// created or is not writable.
    pub async fn open_with_clock(
        dir: impl Into<PathBuf>,
        gc_probability: f64,
        clock: SharedClock,
    ) -> DomainResult<Self> {
        let dir = dir.into();

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::Unavailable {
                message: format!("cannot create revocation directory {}: {}", dir.display(), e),
            })?;

        let marker = dir.join(format!(".write-check-{}", Uuid::new_v4().simple()));
        fs::write(&marker, b"")
            .await
            .map_err(|e| StorageError::Unavailable {
                message: format!("revocation directory {} is not writable: {}", dir.display(), e),
            })?;
        if let Err(e) = fs::remove_file(&marker).await {
            warn!(path = %marker.display(), error = %e, "Failed to remove write-check file");
        }

        let store = Self {
            inner: Arc::new(Inner {
                dir,
                clock,
                gc_probability: AtomicU64::new(0),
                write_lock: Mutex::new(()),
                sweep_in_flight: AtomicBool::new(false),
            }),
        };
        store.set_gc_probability(gc_probability);

        info!(
            path = %store.inner.dir.display(),
            gc_probability = store.gc_probability(),
            "File revocation store ready"
        );
        Ok(store)
    }

    /// Directory holding the records
    pub fn path(&self) -> &Path {
        &self.inner.dir
    }

    /// Probability that an add triggers a background sweep
    pub fn gc_probability(&self) -> f64 {
        f64::from_bits(self.inner.gc_probability.load(Ordering::Relaxed))
    }

    /// Change the background sweep probability, clamped to `[0, 1]`
    pub fn set_gc_probability(&self, probability: f64) {
        let clamped = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        self.inner
            .gc_probability
            .store(clamped.to_bits(), Ordering::Relaxed);
    }

    /// Count records by state
    pub async fn stats(&self) -> DomainResult<FileStoreStats> {
        let now = self.inner.clock.now();
        let mut stats = FileStoreStats {
            total_files: 0,
            live_entries: 0,
            expired_entries: 0,
            malformed_files: 0,
            path: self.inner.dir.clone(),
        };

        let mut dir = fs::read_dir(&self.inner.dir)
            .await
            .map_err(StorageError::from)?;
        while let Some(entry) = dir.next_entry().await.map_err(StorageError::from)? {
            let path = entry.path();
            if !is_record(&path) {
                continue;
            }

            stats.total_files += 1;
            match read_record(&path).await {
                Ok(Some(record)) if record.is_live_at(now) => stats.live_entries += 1,
                Ok(Some(_)) => stats.expired_entries += 1,
                Ok(None) => stats.total_files -= 1,
                Err(_) => stats.malformed_files += 1,
            }
        }

        Ok(stats)
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.inner.dir.join(format!("{}.{}", id, RECORD_EXTENSION))
    }

    /// Remove `path` if it still holds a readable record expired at `now`
    ///
    /// Unreadable or unparsable files are left in place.
    async fn remove_if_expired(&self, path: &Path, now: i64) -> std::io::Result<bool> {
        let _guard = self.inner.write_lock.lock().await;

        match read_record(path).await {
            Ok(Some(record)) if !record.is_live_at(now) => {}
            _ => return Ok(false),
        }

        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn sweep_directory(&self) -> DomainResult<usize> {
        let now = self.inner.clock.now();
        let mut removed = 0;

        let mut dir = fs::read_dir(&self.inner.dir)
            .await
            .map_err(StorageError::from)?;
        while let Some(entry) = dir.next_entry().await.map_err(StorageError::from)? {
            let path = entry.path();
            if !is_record(&path) {
                continue;
            }
            match read_record(&path).await {
                Ok(Some(record)) if !record.is_live_at(now) => {}
                Ok(_) => continue,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping unreadable revocation record");
                    continue;
                }
            }

            match self.remove_if_expired(&path, now).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove expired revocation record");
                }
            }
        }

        Ok(removed)
    }

    /// Start a background sweep with the configured probability
    ///
    /// At most one background sweep runs at a time.
    fn maybe_schedule_sweep(&self) {
        let probability = self.gc_probability();
        if probability <= 0.0 {
            return;
        }
        if probability < 1.0 && !rand::thread_rng().gen_bool(probability) {
            return;
        }
        if self.inner.sweep_in_flight.swap(true, Ordering::AcqRel) {
            return;
        }

        let store = self.clone();
        tokio::spawn(async move {
            match store.sweep_directory().await {
                Ok(removed) => debug!(removed, "Background revocation sweep completed"),
                Err(e) => warn!(error = %e, "Background revocation sweep failed"),
            }
            store.inner.sweep_in_flight.store(false, Ordering::Release);
        });
    }

    fn schedule_removal(&self, path: PathBuf, now: i64) {
        let store = self.clone();
        tokio::spawn(async move {
            if let Err(e) = store.remove_if_expired(&path, now).await {
                debug!(path = %path.display(), error = %e, "Failed to remove expired revocation record");
            }
        });
    }
}

#[async_trait]
impl RevocationStore for FileRevocationStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn add(&self, id: &str, expires_at: i64) -> DomainResult<()> {
        validate_token_id(id)?;
        let now = self.inner.clock.now();
        if expires_at <= now {
            debug!(id = %id, expires_at, "Skipping revocation of already expired token");
            return Ok(());
        }

        let record = RevocationEntry::new(id, expires_at, now);
        let body = serde_json::to_vec(&record).map_err(InfrastructureError::from)?;
        let target = self.record_path(id);
        let temp = self
            .inner
            .dir
            .join(format!(".{}.{}.tmp", id, Uuid::new_v4().simple()));

        {
            let _guard = self.inner.write_lock.lock().await;

            if let Err(e) = fs::write(&temp, &body).await {
                return Err(write_error(&temp, e).into());
            }
            if let Err(e) = fs::rename(&temp, &target).await {
                if let Err(cleanup) = fs::remove_file(&temp).await {
                    debug!(path = %temp.display(), error = %cleanup, "Failed to remove temporary record");
                }
                return Err(write_error(&target, e).into());
            }
        }

        debug!(id = %id, expires_at, "Revocation record written");
        self.maybe_schedule_sweep();
        Ok(())
    }

    async fn is_revoked(&self, id: &str) -> DomainResult<bool> {
        validate_token_id(id)?;
        let path = self.record_path(id);

        let record = match read_record(&path).await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(false),
            Err(e) => {
                warn!(id = %id, error = %e, "Unreadable revocation record treated as absent");
                return Ok(false);
            }
        };

        let now = self.inner.clock.now();
        if record.is_live_at(now) {
            return Ok(true);
        }

        self.schedule_removal(path, now);
        Ok(false)
    }

    async fn sweep(&self) -> DomainResult<usize> {
        let removed = self.sweep_directory().await?;
        info!(removed, path = %self.inner.dir.display(), "File revocation sweep completed");
        Ok(removed)
    }
}

/// A missing or read-only directory does not heal by retrying
fn write_error(path: &Path, err: std::io::Error) -> StorageError {
    let message = format!("{}: {}", path.display(), err);
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => StorageError::Rejected { message },
        _ => StorageError::WriteFailed { message },
    }
}

fn is_record(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == RECORD_EXTENSION)
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| !name.starts_with('.'))
}

/// Read and parse a record; `Ok(None)` when the file does not exist
async fn read_record(path: &Path) -> Result<Option<RevocationEntry>, InfrastructureError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

//! Sweep scheduling for expired revocation entries
//!
//! Two triggers are offered: a rate-limited [`SweepScheduler::maybe_sweep`]
//! suitable for calling on the request path, and a periodic background task
//! started with [`SweepScheduler::start`] and stopped through its handle.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::domain::clock::SharedClock;

use super::gate::RevocationGate;

const NEVER: i64 = i64::MIN;

/// Outcome of a single sweep run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Number of entries removed (best effort)
    pub removed: usize,
    /// Clock time at which the run started
    pub started_at: i64,
    /// Error message if the sweep failed
    pub error: Option<String>,
}

impl SweepReport {
    /// Check if the sweep was successful
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

struct SchedulerInner {
    gate: RevocationGate,
    interval: Duration,
    clock: SharedClock,
    last_sweep_at: AtomicI64,
}

/// Host-owned sweep trigger with an atomic `last_sweep_at`
#[derive(Clone)]
pub struct SweepScheduler {
    inner: Arc<SchedulerInner>,
}

impl SweepScheduler {
    /// Create a scheduler sweeping `gate` at most once per `interval`
    pub fn new(gate: RevocationGate, interval: Duration, clock: SharedClock) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                gate,
                interval,
                clock,
                last_sweep_at: AtomicI64::new(NEVER),
            }),
        }
    }

    /// Configured sweep interval
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Clock time of the last claimed sweep, if any
    pub fn last_sweep_at(&self) -> Option<i64> {
        match self.inner.last_sweep_at.load(Ordering::SeqCst) {
            NEVER => None,
            at => Some(at),
        }
    }

    /// Sweep if at least one interval has passed since the last sweep
    ///
    /// Returns `None` without touching the store when the interval has not
    /// elapsed or another caller claimed the same slot first.
    pub async fn maybe_sweep(&self) -> Option<SweepReport> {
        let now = self.inner.clock.now();
        let last = self.inner.last_sweep_at.load(Ordering::SeqCst);
        let interval = self.inner.interval.as_secs() as i64;

        if last != NEVER && now.saturating_sub(last) < interval {
            return None;
        }

        self.inner
            .last_sweep_at
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;

        Some(self.sweep_at(now).await)
    }

    /// Sweep unconditionally and record the run
    pub async fn run_once(&self) -> SweepReport {
        let now = self.inner.clock.now();
        self.inner.last_sweep_at.store(now, Ordering::SeqCst);
        self.sweep_at(now).await
    }

    async fn sweep_at(&self, started_at: i64) -> SweepReport {
        match self.inner.gate.sweep().await {
            Ok(removed) => {
                info!(
                    backend = self.inner.gate.backend_name(),
                    removed, "Revocation sweep completed"
                );
                SweepReport {
                    removed,
                    started_at,
                    error: None,
                }
            }
            Err(e) => {
                error!(
                    backend = self.inner.gate.backend_name(),
                    error = %e,
                    "Revocation sweep failed"
                );
                SweepReport {
                    removed: 0,
                    started_at,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Start periodic sweeping as a background task
    ///
    /// The first sweep runs one interval after start. Intervals shorter than
    /// one second are raised to one second.
    pub fn start(&self) -> SweepHandle {
        let period = self.inner.interval.max(Duration::from_secs(1));
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let scheduler = self.clone();

        let task = tokio::spawn(async move {
            info!(
                "Revocation sweep scheduler started - will run every {} seconds",
                period.as_secs()
            );

            let mut interval_timer = tokio::time::interval(period);
            interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval_timer.tick().await;

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let report = scheduler.run_once().await;
                        if let Some(err) = report.error {
                            warn!("Scheduled sweep completed with error: {}", err);
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Revocation sweep scheduler stopped");
        });

        SweepHandle { shutdown, task }
    }
}

impl std::fmt::Debug for SweepScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepScheduler")
            .field("gate", &self.inner.gate)
            .field("interval", &self.inner.interval)
            .field("last_sweep_at", &self.last_sweep_at())
            .finish()
    }
}

/// Handle to a running periodic sweep task
pub struct SweepHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Whether the background task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the task to stop and wait for it to exit
    pub async fn stop(self) {
        // The receiver is gone only if the task already exited
        let _ = self.shutdown.send(true);

        if let Err(e) = self.task.await {
            error!("Revocation sweep task ended abnormally: {}", e);
        }
    }
}

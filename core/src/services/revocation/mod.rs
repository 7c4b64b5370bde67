//! Revocation service module
//!
//! This module layers reliability and scheduling on top of a
//! [`RevocationStore`](crate::repositories::RevocationStore):
//! - `RetryingStore` retries transient backend failures with a fixed delay
//! - `RevocationGate` validates ids and is the single entry point for callers
//! - `SweepScheduler` rate-limits and schedules sweeps of expired entries

mod gate;
mod retry;
mod sweeper;

#[cfg(test)]
mod tests;

pub use gate::RevocationGate;
pub use retry::{RetryConfig, RetryingStore};
pub use sweeper::{SweepHandle, SweepReport, SweepScheduler};

//! Business services built on top of the revocation store.

pub mod revocation;
pub mod token;

// Re-export commonly used types
pub use revocation::{
    RetryConfig, RetryingStore, RevocationGate, SweepHandle, SweepReport, SweepScheduler,
};
pub use token::{RevocationCheckPolicy, TokenService, TokenServiceConfig};

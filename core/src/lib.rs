//! # TokenGuard Core
//!
//! Core domain layer for TokenGuard.
//! This crate contains the revocation store contract and its in-process
//! implementation, the retry decorator, the revocation gate, the sweep
//! scheduler and the token service that consults them.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;

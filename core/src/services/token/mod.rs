//! Token service module for JWT management
//!
//! This module handles token-related operations including:
//! - JWT issuance with a fresh `jti` per token
//! - Verification followed by a revocation check
//! - Refresh, which revokes the superseded token
//! - Revocation and cleanup through the revocation gate

mod config;
mod service;


pub use config::{RevocationCheckPolicy, TokenServiceConfig};
pub use service::TokenService;

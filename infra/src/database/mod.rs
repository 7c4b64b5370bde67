//! Database module - MySQL implementations using SQLx
//!
//! This module provides the database-backed revocation store including:
//! - Connection pool management
//! - Table creation at construction
//! - The MySQL revocation store

pub mod connection;
pub mod mysql;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use connection::DatabasePool;
pub use mysql::MySqlRevocationStore;

//! MySQL implementations of core repository traits

pub mod revocation_store_impl;

pub use revocation_store_impl::MySqlRevocationStore;

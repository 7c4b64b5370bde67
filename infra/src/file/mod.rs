//! File module for the local directory revocation store

pub mod file_store;

#[cfg(test)]
mod tests;

pub use file_store::{FileRevocationStore, FileStoreStats};

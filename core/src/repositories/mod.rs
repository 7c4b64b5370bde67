pub mod revocation;

pub use revocation::{MemoryRevocationStore, RevocationStore};

#[cfg(test)]
pub use revocation::MockRevocationStore;

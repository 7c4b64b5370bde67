pub mod r#trait {
    pub use super::trait_::*;
}
#[path = "trait.rs"]
mod trait_;
pub mod memory;

pub use memory::MemoryRevocationStore;
pub use r#trait::RevocationStore;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub use mock::MockRevocationStore;

#[cfg(test)]
mod tests;

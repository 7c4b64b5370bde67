//! Domain layer containing business entities and the time source.

pub mod clock;
pub mod entities;

// Re-export commonly used domain types
pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use entities::*;

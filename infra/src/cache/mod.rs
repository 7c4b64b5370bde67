//! Cache module for the remote revocation stores
//!
//! Redis and Memcached backends both rely on native key expiry instead of
//! sweeping.

#[cfg(feature = "memcached")]
pub mod memcached_store;
pub mod redis_store;

#[cfg(test)]
mod tests;

#[cfg(feature = "memcached")]
pub use memcached_store::MemcachedRevocationStore;
pub use redis_store::RedisRevocationStore;

// Re-export commonly used types
pub use tg_shared::CacheConfig;

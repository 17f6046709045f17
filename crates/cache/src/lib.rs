//! Key-value cache with per-key TTL.
//!
//! Backends implement the string-level [`CacheStore`] trait:
//!
//! - [`MemoryCache`] -- single-instance, DashMap with expiry instants.
//! - [`RedisCache`] -- shared across instances, pooled Redis connections.
//!
//! Callers go through the [`Cache`] facade, which adds typed JSON access and
//! the failure policy: `get`/`set` failures are returned as [`CacheError`],
//! while `delete`/`exists` log the failure and answer `false`.

mod error;
mod facade;
mod memory;
mod redis_store;
mod store;

pub use error::CacheError;
pub use facade::Cache;
pub use memory::MemoryCache;
pub use redis_store::RedisCache;
pub use store::CacheStore;

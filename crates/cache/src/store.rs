use std::time::Duration;

use async_trait::async_trait;

use crate::CacheError;

/// String-level key-value store with per-key time-to-live.
///
/// Keys that never existed, or whose TTL has elapsed, read as absent: `get`
/// returns `Ok(None)` and `exists`/`delete` return `Ok(false)`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the raw value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove `key`. Returns `true` if a live entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Whether a live entry exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
}

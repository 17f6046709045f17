use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{CacheError, CacheStore, MemoryCache};

/// Typed, cheaply cloneable handle over a [`CacheStore`].
///
/// Values are stored as JSON. Read/write failures propagate so callers can
/// decide whether they are fatal; `delete` and `exists` are used on
/// availability paths, so they log backend failures and report `false`.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Convenience constructor over a fresh [`MemoryCache`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()))
    }

    /// Read and decode the value under `key`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let raw = self.store.get(key).await.inspect_err(|e| {
            tracing::error!(key, error = %e, "Error getting cache key");
        })?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode `value` and store it under `key` for `ttl`.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, raw, ttl).await.inspect_err(|e| {
            tracing::error!(key, error = %e, "Error setting cache key");
        })
    }

    /// Remove `key`. Backend failures are logged and reported as `false`.
    pub async fn delete(&self, key: &str) -> bool {
        match self.store.delete(key).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::error!(key, error = %e, "Error deleting cache key");
                false
            }
        }
    }

    /// Whether `key` holds a live entry. Backend failures are logged and
    /// reported as `false`.
    pub async fn exists(&self, key: &str) -> bool {
        match self.store.exists(key).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::error!(key, error = %e, "Error checking cache key existence");
                false
            }
        }
    }
}

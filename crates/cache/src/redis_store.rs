//! Redis cache backend.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime};

use crate::{CacheError, CacheStore};

/// Cache shared across instances, backed by a pooled Redis connection.
///
/// TTLs map onto `PSETEX`, so expiry is enforced by Redis itself.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    /// Build a pool for `url` and check that a connection can be obtained.
    pub async fn connect(url: &str, pool_size: usize) -> Result<Self, CacheError> {
        let mut config = Config::from_url(url);
        config.pool = Some(PoolConfig::new(pool_size));

        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Backend(format!("create redis pool: {e}")))?;

        let cache = Self { pool };
        cache.connection().await?;
        tracing::info!("Connected to Redis");
        Ok(cache)
    }

    async fn connection(&self) -> Result<Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Backend(format!("redis connection: {e}")))
    }
}

/// Redis rejects a zero expiry; clamp to one millisecond.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn backend_error(op: &'static str) -> impl FnOnce(deadpool_redis::redis::RedisError) -> CacheError {
    move |e| CacheError::Backend(format!("redis {op}: {e}"))
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(backend_error("GET"))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.pset_ex::<_, _, ()>(key, value, ttl_millis(ttl))
            .await
            .map_err(backend_error("SET"))
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn.del(key).await.map_err(backend_error("DEL"))?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        conn.exists::<_, bool>(key)
            .await
            .map_err(backend_error("EXISTS"))
    }
}

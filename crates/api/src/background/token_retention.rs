//! Periodic cleanup of refresh-token state that can no longer be redeemed.
//!
//! An `authentications` row outlives the signed expiry of its token, and the
//! in-process cache only evicts expired entries when they are touched. This
//! job purges both on a fixed interval using `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tollgate_cache::MemoryCache;
use tollgate_db::repositories::AuthenticationRepo;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the token retention cleanup loop until `cancel` is triggered.
///
/// Deletes `authentications` rows older than `max_age` (the refresh token
/// lifetime) and, when given, purges expired entries from `memory`.
pub async fn run(
    pool: PgPool,
    memory: Option<Arc<MemoryCache>>,
    max_age: chrono::Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        max_age_mins = max_age.num_minutes(),
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Token retention job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Token retention job stopping");
                break;
            }
            _ = interval.tick() => {
                purge_once(&pool, memory.as_deref(), max_age).await;
            }
        }
    }
}

/// One cleanup pass. Failures are logged; the next tick retries.
pub async fn purge_once(pool: &PgPool, memory: Option<&MemoryCache>, max_age: chrono::Duration) {
    let cutoff = Utc::now() - max_age;
    match AuthenticationRepo::delete_created_before(pool, cutoff).await {
        Ok(deleted) if deleted > 0 => {
            tracing::info!(deleted, "Token retention: purged stale refresh token rows");
        }
        Ok(_) => tracing::debug!("Token retention: no rows to purge"),
        Err(e) => tracing::error!(error = %e, "Token retention: cleanup failed"),
    }

    if let Some(memory) = memory {
        let purged = memory.purge_expired();
        tracing::debug!(purged, remaining = memory.len(), "Token retention: cache purged");
    }
}

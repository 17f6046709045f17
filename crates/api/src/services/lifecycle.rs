//! Server-side refresh-token state.
//!
//! A signed refresh token is only redeemable while the server still holds
//! state for it. Two interchangeable designs implement [`TokenLifecycle`]:
//!
//! - [`DatabaseTokenLifecycle`]: one `authentications` row per issued token.
//!   The row is the whole state, so revoking and consuming both delete it.
//! - [`CacheTokenLifecycle`]: an active marker under `refresh_token:<token>`
//!   plus an independent deny marker under `blacklisted:<token>`. A token is
//!   redeemable only while the first exists and the second does not.
//!
//! ```text
//! issue ──> ACTIVE ──consume──> CONSUMED
//!             │
//!             └──revoke──> REVOKED     (TTL expiry ends every state)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tollgate_cache::Cache;
use tollgate_core::cache_keys::{blacklisted_token_key, refresh_token_key, token_prefix};
use tollgate_core::error::CoreError;
use tollgate_core::types::DbId;
use tollgate_db::models::authentication::CreateAuthentication;
use tollgate_db::repositories::AuthenticationRepo;

/// Value stored under the blacklist key.
const BLACKLISTED_MARKER: &str = "blacklisted";

/// Lifecycle state of issued refresh tokens.
#[async_trait]
pub trait TokenLifecycle: Send + Sync {
    /// Record `token` as active for `user_id`. Must succeed before the token
    /// is handed to a client.
    async fn issue(&self, token: &str, user_id: DbId, ttl: Duration) -> Result<(), CoreError>;

    /// Whether `token` has been explicitly revoked. Lookup failures read as
    /// not revoked.
    async fn is_revoked(&self, token: &str) -> bool;

    /// Whether `token` is issued, not consumed and not revoked.
    async fn is_redeemable(&self, token: &str) -> Result<bool, CoreError>;

    /// Mark `token` revoked for `ttl`, whether or not it is currently active.
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), CoreError>;

    /// Remove the active state for `token`. Returns whether anything was
    /// removed; consuming an unknown token is not an error.
    async fn consume(&self, token: &str) -> Result<bool, CoreError>;
}

// ---------------------------------------------------------------------------
// Store-and-check
// ---------------------------------------------------------------------------

/// Refresh-token state as rows of the `authentications` table.
#[derive(Clone)]
pub struct DatabaseTokenLifecycle {
    pool: PgPool,
}

impl DatabaseTokenLifecycle {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenLifecycle for DatabaseTokenLifecycle {
    async fn issue(&self, token: &str, user_id: DbId, _ttl: Duration) -> Result<(), CoreError> {
        let input = CreateAuthentication {
            token: token.to_string(),
            user_id,
        };
        AuthenticationRepo::create(&self.pool, &input)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to store refresh token: {e}")))?
            .ok_or_else(|| CoreError::Internal("failed to create authentication token".into()))?;

        tracing::info!(user_id, token = token_prefix(token), "Refresh token stored");
        Ok(())
    }

    /// Rows carry no deny state; revocation is the absence of the row.
    async fn is_revoked(&self, _token: &str) -> bool {
        false
    }

    async fn is_redeemable(&self, token: &str) -> Result<bool, CoreError> {
        let exists = AuthenticationRepo::exists(&self.pool, token)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to look up refresh token: {e}")))?;
        tracing::debug!(token = token_prefix(token), exists, "Refresh token row lookup");
        Ok(exists)
    }

    async fn revoke(&self, token: &str, _ttl: Duration) -> Result<(), CoreError> {
        self.consume(token).await.map(|_| ())
    }

    async fn consume(&self, token: &str) -> Result<bool, CoreError> {
        let deleted = AuthenticationRepo::delete(&self.pool, token)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to delete refresh token: {e}")))?;
        tracing::info!(token = token_prefix(token), deleted, "Refresh token row removed");
        Ok(deleted)
    }
}

// ---------------------------------------------------------------------------
// Cache allow/deny
// ---------------------------------------------------------------------------

/// Snapshot written under `refresh_token:<token>` at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRefreshToken {
    pub user_id: DbId,
    /// Issuance time in Unix milliseconds.
    pub created_at: i64,
    pub token: String,
}

/// Refresh-token state as allow/deny markers in the cache.
#[derive(Clone)]
pub struct CacheTokenLifecycle {
    cache: Cache,
}

impl CacheTokenLifecycle {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl TokenLifecycle for CacheTokenLifecycle {
    async fn issue(&self, token: &str, user_id: DbId, ttl: Duration) -> Result<(), CoreError> {
        let entry = ActiveRefreshToken {
            user_id,
            created_at: Utc::now().timestamp_millis(),
            token: token.to_string(),
        };
        self.cache
            .set(&refresh_token_key(token), &entry, ttl)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to store refresh token: {e}")))?;

        tracing::info!(user_id, "Refresh token stored");
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> bool {
        let blacklisted = self.cache.exists(&blacklisted_token_key(token)).await;
        tracing::debug!(token = token_prefix(token), blacklisted, "Token blacklist check");
        blacklisted
    }

    async fn is_redeemable(&self, token: &str) -> Result<bool, CoreError> {
        let active = self.cache.exists(&refresh_token_key(token)).await;
        let blacklisted = self.is_revoked(token).await;
        let redeemable = active && !blacklisted;
        tracing::debug!(
            token = token_prefix(token),
            active,
            blacklisted,
            redeemable,
            "Refresh token validation"
        );
        Ok(redeemable)
    }

    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), CoreError> {
        self.cache
            .set(&blacklisted_token_key(token), BLACKLISTED_MARKER, ttl)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to blacklist token: {e}")))?;
        tracing::info!(token = token_prefix(token), "Token blacklisted");
        Ok(())
    }

    async fn consume(&self, token: &str) -> Result<bool, CoreError> {
        let deleted = self.cache.delete(&refresh_token_key(token)).await;
        tracing::info!(token = token_prefix(token), deleted, "Refresh token removed");
        Ok(deleted)
    }
}

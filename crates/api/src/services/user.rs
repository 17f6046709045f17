//! Identity lookups through the `user:<username>` read-through cache.

use std::sync::Arc;
use std::time::Duration;

use tollgate_cache::Cache;
use tollgate_core::cache_keys;
use tollgate_core::error::CoreError;
use tollgate_db::models::user::User;

use super::credentials::CredentialStore;

/// How long an identity snapshot stays cached.
pub const USER_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Identity lookups and availability checks.
///
/// Cache failures never fail a lookup: a failed read falls through to the
/// credential store and a failed write is logged and dropped.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn CredentialStore>,
    cache: Cache,
}

impl UserService {
    pub fn new(store: Arc<dyn CredentialStore>, cache: Cache) -> Self {
        Self { store, cache }
    }

    /// Find an identity by username, consulting the cache first.
    ///
    /// Only found identities are cached; a miss in the store is not.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, CoreError> {
        let key = cache_keys::user_key(username);

        match self.cache.get::<User>(&key).await {
            Ok(Some(user)) => {
                tracing::debug!(username, "User cache hit");
                return Ok(Some(user));
            }
            Ok(None) => tracing::debug!(username, "User cache miss"),
            Err(e) => tracing::warn!(username, error = %e, "User cache read failed, using store"),
        }

        let user = self.store.find_by_username(username).await?;

        if let Some(user) = &user {
            match self.cache.set(&key, user, USER_CACHE_TTL).await {
                Ok(()) => tracing::debug!(username, "User cached"),
                Err(e) => tracing::warn!(username, error = %e, "Failed to cache user"),
            }
        }

        Ok(user)
    }

    pub async fn is_username_available(&self, username: &str) -> Result<bool, CoreError> {
        Ok(!self.store.username_exists(username).await?)
    }

    pub async fn is_email_available(&self, email: &str) -> Result<bool, CoreError> {
        Ok(!self.store.email_exists(email).await?)
    }

    /// Drop the cached snapshot for `username`. Never fails.
    pub async fn invalidate_user_cache(&self, username: &str) {
        let deleted = self.cache.delete(&cache_keys::user_key(username)).await;
        tracing::info!(username, deleted, "User cache invalidated");
    }
}

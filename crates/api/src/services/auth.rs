//! Register / login / refresh / logout orchestration.
//!
//! Every failure a client can trigger collapses to one constant message per
//! operation, so responses never reveal which check rejected the request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::task::JoinError;
use tracing::Instrument;
use tollgate_core::cache_keys::token_prefix;
use tollgate_core::context::RequestContext;
use tollgate_core::error::CoreError;
use tollgate_db::models::user::{CreateUser, User};
use uuid::Uuid;

use super::credentials::{CredentialStore, DUPLICATE_IDENTITY_MESSAGE};
use super::lifecycle::TokenLifecycle;
use super::user::UserService;
use crate::auth::jwt::{self, JwtConfig};
use crate::auth::password::{hash_password, verify_password};

/// Claim carrying a per-login random id, so two logins in the same second
/// never mint the same refresh token.
pub const TOKEN_ID_CLAIM: &str = "jti";

/// Returned for unknown usernames and wrong passwords alike.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "email or password is invalid";

/// Returned for every refresh rejection.
pub const INVALID_TOKEN_MESSAGE: &str = "token is invalid or expired";

/// Input for [`AuthService::register`]. The password is plaintext.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Input for [`AuthService::authenticate`].
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Tokens returned by a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Token returned by a successful refresh.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
}

/// Coordinates the credential store, identity cache, token codec and
/// refresh-token lifecycle.
#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    users: UserService,
    lifecycle: Arc<dyn TokenLifecycle>,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        users: UserService,
        lifecycle: Arc<dyn TokenLifecycle>,
        jwt: JwtConfig,
    ) -> Self {
        Self {
            credentials,
            users,
            lifecycle,
            jwt,
        }
    }

    /// Create an identity and return its username.
    ///
    /// The username is checked before the email, and a taken username stops
    /// the check there.
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id, username = %identity.username))]
    pub async fn register(
        &self,
        ctx: &RequestContext,
        identity: NewIdentity,
    ) -> Result<String, CoreError> {
        if !self.users.is_username_available(&identity.username).await? {
            tracing::info!("Registration rejected, username taken");
            return Err(conflict());
        }
        if !self.users.is_email_available(&identity.email).await? {
            tracing::info!("Registration rejected, email taken");
            return Err(conflict());
        }

        let NewIdentity {
            username,
            email,
            phone,
            password,
        } = identity;

        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(task_failed)?
            .map_err(|e| CoreError::Internal(format!("Password hashing error: {e}")))?;

        let input = CreateUser {
            username,
            email,
            phone,
            password_hash,
        };
        let user = self
            .credentials
            .insert(&input)
            .await?
            .ok_or_else(|| CoreError::Internal("failed to create user".into()))?;

        self.users.invalidate_user_cache(&user.username).await;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user.username)
    }

    /// Check credentials and mint an access/refresh token pair.
    ///
    /// The refresh token's lifecycle state is written before the pair is
    /// returned; if that write fails the whole login fails.
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id, username = %credentials.username))]
    pub async fn authenticate(
        &self,
        ctx: &RequestContext,
        credentials: Credentials,
    ) -> Result<TokenPair, CoreError> {
        let Some(user) = self.users.get_by_username(&credentials.username).await? else {
            tracing::info!("Login rejected, unknown user");
            return Err(invalid_credentials());
        };

        let password = credentials.password;
        let password_hash = user.password_hash.clone();
        let password_valid =
            tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                .await
                .map_err(task_failed)?
                .map_err(|e| {
                    CoreError::Internal(format!("Password verification error: {e}"))
                })?;

        if !password_valid {
            tracing::info!("Login rejected, wrong password");
            return Err(invalid_credentials());
        }

        let access_token = self.mint_access_token(&user)?;
        let mut claims = Map::new();
        claims.insert(
            TOKEN_ID_CLAIM.into(),
            Value::from(Uuid::new_v4().to_string()),
        );
        let refresh_token = jwt::generate(
            &self.jwt.refresh_secret,
            &user.username,
            Utc::now() + self.jwt.refresh_ttl(),
            &claims,
        )
        .map_err(|e| CoreError::Internal(format!("Token generation error: {e}")))?;

        self.lifecycle
            .issue(&refresh_token, user.id, self.refresh_lifetime())
            .await?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Checks run in a fixed order and stop at the first failure: revocation
    /// (before any decoding), decode, identity lookup, lifecycle state,
    /// signature against the identity, subject against the current username.
    /// The refresh token itself is not rotated.
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id, token = token_prefix(refresh_token)))]
    pub async fn refresh(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<AccessToken, CoreError> {
        if self.lifecycle.is_revoked(refresh_token).await {
            tracing::info!("Refresh rejected, token revoked");
            return Err(invalid_token());
        }

        let subject = match jwt::extract_subject(&self.jwt.refresh_secret, refresh_token) {
            Ok(Some(subject)) => subject,
            Ok(None) => {
                tracing::info!("Refresh rejected, token has no subject");
                return Err(invalid_token());
            }
            Err(e) => {
                tracing::info!(reason = %e, "Refresh rejected, token did not decode");
                return Err(invalid_token());
            }
        };

        let Some(user) = self.users.get_by_username(&subject).await? else {
            tracing::info!(subject, "Refresh rejected, unknown subject");
            return Err(invalid_token());
        };

        if !self.lifecycle.is_redeemable(refresh_token).await? {
            tracing::info!(user_id = user.id, "Refresh rejected, token not redeemable");
            return Err(invalid_token());
        }

        match jwt::is_valid(&self.jwt.refresh_secret, refresh_token, &user) {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(user_id = user.id, "Refresh rejected, token not valid for user");
                return Err(invalid_token());
            }
            Err(e) => {
                tracing::info!(user_id = user.id, reason = %e, "Refresh rejected on revalidation");
                return Err(invalid_token());
            }
        }

        if subject != user.username {
            tracing::info!(user_id = user.id, "Refresh rejected, subject mismatch");
            return Err(invalid_token());
        }

        let access_token = self.mint_access_token(&user)?;
        tracing::info!(user_id = user.id, "Access token refreshed");
        Ok(AccessToken { access_token })
    }

    /// Revoke and consume `refresh_token`.
    ///
    /// Both steps run on their own tasks and are always both attempted.
    /// Failures are logged and never returned.
    #[tracing::instrument(skip_all, fields(trace_id = %ctx.trace_id, token = token_prefix(refresh_token)))]
    pub async fn logout(&self, ctx: &RequestContext, refresh_token: &str) {
        let ttl = self.refresh_lifetime();

        let revoke = {
            let lifecycle = Arc::clone(&self.lifecycle);
            let token = refresh_token.to_string();
            tokio::spawn(
                async move { lifecycle.revoke(&token, ttl).await }
                    .instrument(tracing::Span::current()),
            )
        };
        let consume = {
            let lifecycle = Arc::clone(&self.lifecycle);
            let token = refresh_token.to_string();
            tokio::spawn(
                async move { lifecycle.consume(&token).await }
                    .instrument(tracing::Span::current()),
            )
        };

        let (revoked, consumed) = tokio::join!(revoke, consume);

        match revoked {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Logout: failed to revoke token"),
            Err(e) => tracing::error!(error = %e, "Logout: revoke task aborted"),
        }
        match consumed {
            Ok(Ok(deleted)) => tracing::debug!(deleted, "Logout: active state removed"),
            Ok(Err(e)) => tracing::error!(error = %e, "Logout: failed to remove active state"),
            Err(e) => tracing::error!(error = %e, "Logout: consume task aborted"),
        }

        tracing::info!("User logged out");
    }

    fn mint_access_token(&self, user: &User) -> Result<String, CoreError> {
        jwt::generate(
            &self.jwt.access_secret,
            &user.username,
            Utc::now() + self.jwt.access_ttl(),
            &Map::new(),
        )
        .map_err(|e| CoreError::Internal(format!("Token generation error: {e}")))
    }

    fn refresh_lifetime(&self) -> Duration {
        self.jwt.refresh_ttl().to_std().unwrap_or_default()
    }
}

fn conflict() -> CoreError {
    CoreError::Conflict(DUPLICATE_IDENTITY_MESSAGE.into())
}

fn invalid_credentials() -> CoreError {
    CoreError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.into())
}

fn invalid_token() -> CoreError {
    CoreError::Unauthorized(INVALID_TOKEN_MESSAGE.into())
}

fn task_failed(e: JoinError) -> CoreError {
    CoreError::Internal(format!("Blocking task failed: {e}"))
}

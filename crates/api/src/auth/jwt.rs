//! JWT generation and verification for access and refresh tokens.
//!
//! Both token classes are HS256-signed JWTs with the same claim shape and
//! differ only in lifetime and signing secret. Each secret is scoped to one
//! class, so a refresh token never verifies as an access token and vice versa.
//!
//! Expiry is checked here rather than by `jsonwebtoken` so that a token is
//! rejected exactly at its `exp` second, with no leeway.

use std::collections::HashSet;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tollgate_core::types::Timestamp;
use tollgate_db::models::user::User;

/// Value of the `iss` claim on every token this service mints.
pub const TOKEN_ISSUER: &str = "tollgate";

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject -- the username the token was minted for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Issuer, always [`TOKEN_ISSUER`] for tokens minted here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Issued-at time (UTC Unix timestamp).
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Caller-supplied claims carried alongside the reserved ones.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Why a token could not be minted or accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token could not be signed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret for access tokens.
    pub access_secret: String,
    /// HMAC-SHA256 secret for refresh tokens. Must differ from `access_secret`.
    pub refresh_secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in minutes (default: 1440).
    pub refresh_token_expiry_mins: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in minutes (24 hours).
const DEFAULT_REFRESH_EXPIRY_MINS: i64 = 1440;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_ACCESS_SECRET`        | **yes**  | --      |
    /// | `JWT_REFRESH_SECRET`       | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_MINS`  | no       | `1440`  |
    ///
    /// # Panics
    ///
    /// Panics if either secret is missing or empty, if the two secrets are
    /// equal, or if an expiry is not a positive integer no larger than
    /// [`MAX_EXPIRY_MINS`].
    pub fn from_env() -> Self {
        let access_secret = std::env::var("JWT_ACCESS_SECRET")
            .expect("JWT_ACCESS_SECRET must be set in the environment");
        let refresh_secret = std::env::var("JWT_REFRESH_SECRET")
            .expect("JWT_REFRESH_SECRET must be set in the environment");
        assert!(!access_secret.is_empty(), "JWT_ACCESS_SECRET must not be empty");
        assert!(!refresh_secret.is_empty(), "JWT_REFRESH_SECRET must not be empty");
        assert_ne!(
            access_secret, refresh_secret,
            "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ"
        );

        let access_token_expiry_mins = expiry_from_env(
            "JWT_ACCESS_EXPIRY_MINS",
            DEFAULT_ACCESS_EXPIRY_MINS,
        );
        let refresh_token_expiry_mins = expiry_from_env(
            "JWT_REFRESH_EXPIRY_MINS",
            DEFAULT_REFRESH_EXPIRY_MINS,
        );

        Self {
            access_secret,
            refresh_secret,
            access_token_expiry_mins,
            refresh_token_expiry_mins,
        }
    }

    /// Access token lifetime.
    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_expiry_mins)
    }

    /// Refresh token lifetime.
    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.refresh_token_expiry_mins)
    }
}

/// Longest accepted token lifetime (100 years). Anything larger risks
/// overflowing timestamp arithmetic when tokens are minted.
pub const MAX_EXPIRY_MINS: i64 = 100 * 365 * 24 * 60;

fn expiry_from_env(name: &str, default: i64) -> i64 {
    parse_expiry(name, std::env::var(name).ok().as_deref(), default)
        .unwrap_or_else(|e| panic!("{e}"))
}

fn parse_expiry(name: &str, raw: Option<&str>, default: i64) -> Result<i64, String> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let mins: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a valid i64"))?;
    if mins <= 0 {
        return Err(format!("{name} must be positive"));
    }
    if mins > MAX_EXPIRY_MINS {
        return Err(format!("{name} must be at most {MAX_EXPIRY_MINS} minutes"));
    }
    Ok(mins)
}

/// Mint a signed token for `subject` expiring at `expires_at`.
///
/// `additional_claims` are copied into the payload first; the reserved
/// `sub`, `iss`, `iat` and `exp` claims are written last and win any
/// collision.
pub fn generate(
    secret: &str,
    subject: &str,
    expires_at: Timestamp,
    additional_claims: &Map<String, Value>,
) -> Result<String, TokenError> {
    let mut claims = additional_claims.clone();
    claims.insert("sub".into(), Value::from(subject));
    claims.insert("iss".into(), Value::from(TOKEN_ISSUER));
    claims.insert("iat".into(), Value::from(Utc::now().timestamp()));
    claims.insert("exp".into(), Value::from(expires_at.timestamp()));

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Verify the signature of `token` and decode its claims.
///
/// Fails with [`TokenError::Malformed`] when the token cannot be parsed,
/// [`TokenError::InvalidSignature`] when it was not signed with `secret`, and
/// [`TokenError::Expired`] once the current time reaches `exp`.
pub fn verify_and_decode(secret: &str, token: &str) -> Result<Claims, TokenError> {
    verify_and_decode_at(secret, token, Utc::now().timestamp())
}

fn verify_and_decode_at(secret: &str, token: &str, now: i64) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    if now >= data.claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(data.claims)
}

/// Decode `token` and return its subject, if it carries one.
pub fn extract_subject(secret: &str, token: &str) -> Result<Option<String>, TokenError> {
    Ok(verify_and_decode(secret, token)?.sub)
}

/// Whether `token` was minted for `user` and has not expired.
///
/// Decode failures are returned as errors, never folded into `Ok(false)`.
pub fn is_valid(secret: &str, token: &str, user: &User) -> Result<bool, TokenError> {
    let claims = verify_and_decode(secret, token)?;
    let subject_matches = claims.sub.as_deref() == Some(user.username.as_str());
    Ok(subject_matches && Utc::now().timestamp() < claims.exp)
}

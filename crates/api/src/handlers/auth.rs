//! Handlers for the `/auth` resource (register, login, refresh, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tollgate_core::cache_keys::token_prefix;
use tollgate_core::error::CoreError;
use validator::{Validate, ValidationError};

use crate::error::AppResult;
use crate::middleware::request_context::Traced;
use crate::middleware::validated_json::ValidatedJson;
use crate::response::WebResponse;
use crate::services::auth::{AccessToken, Credentials, NewIdentity, TokenPair};
use crate::state::AppState;

/// Cookie carrying the access token after login or refresh.
pub const ACCESS_COOKIE: &str = "auth-token";
/// Cookie carrying the refresh token after login.
pub const REFRESH_COOKIE: &str = "refresh-token";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        email(message = "email is not valid"),
        length(max = 255, message = "email cannot be more than 255 characters")
    )]
    pub email: String,

    #[validate(
        custom(function = "not_blank", message = "username cannot be blank"),
        length(max = 255, message = "username cannot be more than 255 characters")
    )]
    pub username: String,

    #[validate(
        custom(function = "not_blank", message = "phone cannot be blank"),
        length(max = 20, message = "phone cannot be more than 20 characters")
    )]
    pub phone: String,

    #[validate(
        custom(function = "not_blank", message = "password cannot be blank"),
        length(max = 255, message = "password cannot be more than 255 characters")
    )]
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        custom(function = "not_blank", message = "username or email cannot be blank"),
        length(max = 50, message = "username or email cannot be more than 50 characters")
    )]
    pub username: String,

    #[validate(
        custom(function = "not_blank", message = "password cannot be blank"),
        length(max = 255, message = "password cannot be more than 255 characters")
    )]
    pub password: String,
}

/// Request body for `PUT /auth/refresh` and `DELETE /auth/logout`.
///
/// The token may be omitted from the body when it travels in the
/// `refresh-token` cookie instead.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TokenRequest {
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Pick the body token, falling back to the `refresh-token` cookie.
fn resolve_refresh_token(input: TokenRequest, jar: &CookieJar) -> AppResult<String> {
    input
        .refresh_token
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| CoreError::Validation("refreshToken cannot be blank".into()).into())
}

/// Cookie living exactly as long as the token it carries.
fn session_cookie(name: &'static str, value: String, lifetime_mins: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(time::Duration::minutes(lifetime_mins))
        .build()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/register
///
/// Create an identity. Responds 201 with the registered username.
pub async fn register(
    State(state): State<AppState>,
    Traced(ctx): Traced,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<WebResponse<String>>)> {
    tracing::info!(trace_id = %ctx.trace_id, username = %input.username, "User registering");

    let username = state
        .auth
        .register(
            &ctx,
            NewIdentity {
                username: input.username,
                email: input.email,
                phone: input.phone,
                password: input.password,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::new(
            StatusCode::CREATED,
            "user registered successfully",
            username,
        )),
    ))
}

/// POST /api/auth/login
///
/// Authenticate with username + password. Returns both tokens in the body
/// and sets them as cookies.
pub async fn login(
    State(state): State<AppState>,
    Traced(ctx): Traced,
    jar: CookieJar,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<WebResponse<TokenPair>>)> {
    tracing::info!(trace_id = %ctx.trace_id, username = %input.username, "User logging in");

    let tokens = state
        .auth
        .authenticate(
            &ctx,
            Credentials {
                username: input.username,
                password: input.password,
            },
        )
        .await?;

    let jwt = &state.config.jwt;
    let jar = jar
        .add(session_cookie(
            ACCESS_COOKIE,
            tokens.access_token.clone(),
            jwt.access_token_expiry_mins,
        ))
        .add(session_cookie(
            REFRESH_COOKIE,
            tokens.refresh_token.clone(),
            jwt.refresh_token_expiry_mins,
        ));

    Ok((
        jar,
        Json(WebResponse::new(
            StatusCode::OK,
            "user logged in successfully",
            tokens,
        )),
    ))
}

/// PUT /api/auth/refresh
///
/// Exchange a refresh token for a new access token.
pub async fn refresh(
    State(state): State<AppState>,
    Traced(ctx): Traced,
    jar: CookieJar,
    ValidatedJson(input): ValidatedJson<TokenRequest>,
) -> AppResult<(CookieJar, Json<WebResponse<AccessToken>>)> {
    let refresh_token = resolve_refresh_token(input, &jar)?;
    tracing::info!(
        trace_id = %ctx.trace_id,
        token = token_prefix(&refresh_token),
        "User refreshing token"
    );

    let token = state.auth.refresh(&ctx, &refresh_token).await?;

    let jar = jar.add(session_cookie(
        ACCESS_COOKIE,
        token.access_token.clone(),
        state.config.jwt.access_token_expiry_mins,
    ));

    Ok((
        jar,
        Json(WebResponse::new(
            StatusCode::OK,
            "refresh token successfully",
            token,
        )),
    ))
}

/// DELETE /api/auth/logout
///
/// Revoke a refresh token. Succeeds whether or not the token was known.
pub async fn logout(
    State(state): State<AppState>,
    Traced(ctx): Traced,
    jar: CookieJar,
    ValidatedJson(input): ValidatedJson<TokenRequest>,
) -> AppResult<(CookieJar, Json<WebResponse<&'static str>>)> {
    let refresh_token = resolve_refresh_token(input, &jar)?;
    tracing::info!(
        trace_id = %ctx.trace_id,
        token = token_prefix(&refresh_token),
        "User logging out"
    );

    state.auth.logout(&ctx, &refresh_token).await;

    let jar = jar
        .remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"));

    Ok((
        jar,
        Json(WebResponse::new(
            StatusCode::OK,
            "user logged out successfully",
            "user logged out successfully",
        )),
    ))
}

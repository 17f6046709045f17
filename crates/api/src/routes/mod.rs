pub mod auth;
pub mod greet;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /auth/register     register (POST)
/// /auth/login        login (POST)
/// /auth/refresh      refresh access token (PUT)
/// /auth/logout       logout (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/auth", auth::router())
}

//! Route definitions for the `/auth` resource.

use axum::routing::{delete, post, put};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /register -> register
/// POST   /login    -> login
/// PUT    /refresh  -> refresh
/// DELETE /logout   -> logout
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", put(auth::refresh))
        .route("/logout", delete(auth::logout))
}

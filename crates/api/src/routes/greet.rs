use axum::{routing::get, Router};

use crate::state::AppState;

/// GET /greet -- liveness probe that touches no backing service.
async fn greet() -> &'static str {
    "Hello, World!"
}

pub fn router() -> Router<AppState> {
    Router::new().route("/greet", get(greet))
}

//! Shared response envelope for API handlers.
//!
//! Successful responses use `{ "meta": { "code", "message" }, "data" }`.
//! Error bodies are produced by [`AppError`](crate::error::AppError) instead.

use axum::http::StatusCode;
use serde::Serialize;

/// Status line of a [`WebResponse`].
#[derive(Debug, Serialize)]
pub struct MetaResponse {
    /// HTTP status code as a string, e.g. `"201"`.
    pub code: String,
    pub message: String,
}

/// Standard `{ "meta", "data" }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(WebResponse::new(StatusCode::OK, "user logged in successfully", tokens)))
/// ```
#[derive(Debug, Serialize)]
pub struct WebResponse<T: Serialize> {
    pub meta: MetaResponse,
    pub data: Option<T>,
}

impl<T: Serialize> WebResponse<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            meta: MetaResponse {
                code: status.as_u16().to_string(),
                message: message.into(),
            },
            data: Some(data),
        }
    }
}

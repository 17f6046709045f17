//! Correlation-id extractor.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tollgate_core::context::RequestContext;

/// Header carrying the request id set by `SetRequestIdLayer`.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The [`RequestContext`] of the current request.
///
/// Reuses the `x-request-id` header so service logs share the id the client
/// sees on the response. A fresh id is generated when the header is absent
/// or unreadable.
///
/// ```ignore
/// async fn my_handler(Traced(ctx): Traced) -> AppResult<Json<()>> {
///     service.do_work(&ctx).await?;
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Traced(pub RequestContext);

impl<S> FromRequestParts<S> for Traced
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .map(RequestContext::new)
            .unwrap_or_else(RequestContext::generate);

        Ok(Traced(ctx))
    }
}

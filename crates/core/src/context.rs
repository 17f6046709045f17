//! Request-scoped correlation context.
//!
//! A [`RequestContext`] is built once per inbound request and passed by
//! reference into every service call, so log lines emitted deep inside the
//! auth flow can be tied back to the request that caused them.

use uuid::Uuid;

/// Correlation data for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Correlation id, taken from `x-request-id` when present.
    pub trace_id: String,
}

impl RequestContext {
    /// Use an existing correlation id (e.g. the propagated request id).
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
        }
    }

    /// Generate a fresh correlation id.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

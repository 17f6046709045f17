//! Request extractors shared by the handlers.
//!
//! - [`request_context`] -- correlation id from `x-request-id`.
//! - [`validated_json`] -- JSON body parsing plus field validation.

pub mod request_context;
pub mod validated_json;

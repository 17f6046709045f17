//! Domain primitives shared by every Tollgate crate.
//!
//! - [`error`] -- the service-wide error taxonomy.
//! - [`types`] -- id and timestamp aliases.
//! - [`cache_keys`] -- key namespaces in the cache/session store.
//! - [`context`] -- per-request correlation context.

pub mod cache_keys;
pub mod context;
pub mod error;
pub mod types;

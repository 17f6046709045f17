//! Domain services behind the HTTP handlers.
//!
//! - [`credentials`] -- identity persistence seam ([`CredentialStore`]).
//! - [`user`] -- identity lookups through the `user:<username>` cache.
//! - [`lifecycle`] -- server-side refresh-token state ([`TokenLifecycle`]).
//! - [`auth`] -- register / login / refresh / logout orchestration.

pub mod auth;
pub mod credentials;
pub mod lifecycle;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::AuthService;
pub use credentials::{CredentialStore, PgCredentialStore};
pub use lifecycle::{CacheTokenLifecycle, DatabaseTokenLifecycle, TokenLifecycle};
pub use user::UserService;

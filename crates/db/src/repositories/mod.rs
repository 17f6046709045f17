//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod authentication_repo;
pub mod user_repo;

pub use authentication_repo::AuthenticationRepo;
pub use user_repo::UserRepo;

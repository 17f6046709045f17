//! Token and password primitives.
//!
//! - [`jwt`] -- signed access/refresh token generation and verification.
//! - [`password`] -- Argon2id password hashing and verification.

pub mod jwt;
pub mod password;

//! Refresh-token row model for the store-and-check lifecycle.

use sqlx::FromRow;
use tollgate_core::types::{DbId, Timestamp};

/// A row of the `authentications` table, keyed by the refresh token itself.
#[derive(Debug, Clone, FromRow)]
pub struct Authentication {
    pub token: String,
    pub user_id: DbId,
    pub created_at: Timestamp,
}

/// DTO for recording a newly issued refresh token.
pub struct CreateAuthentication {
    pub token: String,
    pub user_id: DbId,
}

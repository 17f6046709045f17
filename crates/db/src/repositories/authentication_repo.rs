//! Repository for the `authentications` table.

use sqlx::PgPool;
use tollgate_core::types::Timestamp;

use crate::models::authentication::{Authentication, CreateAuthentication};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "token, user_id, created_at";

/// Provides CRUD operations for refresh-token rows.
pub struct AuthenticationRepo;

impl AuthenticationRepo {
    /// Record an issued refresh token, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAuthentication,
    ) -> Result<Option<Authentication>, sqlx::Error> {
        let query = format!(
            "INSERT INTO authentications (token, user_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Authentication>(&query)
            .bind(&input.token)
            .bind(input.user_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a row exists for this refresh token.
    pub async fn exists(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM authentications WHERE token = $1)",
        )
        .bind(token)
        .fetch_one(pool)
        .await
    }

    /// Delete the row for a refresh token. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM authentications WHERE token = $1")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete rows created before `cutoff`. Returns the count of deleted rows.
    ///
    /// Rows outlive the signed expiry of their token; this purges them once
    /// the token can no longer verify anyway.
    pub async fn delete_created_before(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM authentications WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

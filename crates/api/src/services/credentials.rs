//! Identity persistence seam.

use async_trait::async_trait;
use sqlx::PgPool;
use tollgate_core::error::CoreError;
use tollgate_db::models::user::{CreateUser, User};
use tollgate_db::repositories::UserRepo;

/// Message returned for any duplicate username or email.
pub const DUPLICATE_IDENTITY_MESSAGE: &str = "username or email already exists";

/// PostgreSQL unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Lookup and creation of identities.
///
/// Unknown usernames and emails are `Ok(None)` / `Ok(false)`, never errors.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, CoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CoreError>;

    /// Persist a new identity. `password_hash` must already be hashed.
    async fn insert(&self, input: &CreateUser) -> Result<Option<User>, CoreError>;

    async fn username_exists(&self, username: &str) -> Result<bool, CoreError>;

    async fn email_exists(&self, email: &str) -> Result<bool, CoreError>;
}

/// [`CredentialStore`] backed by the `users` table.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, CoreError> {
        UserRepo::find_by_username(&self.pool, username)
            .await
            .map_err(map_db_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CoreError> {
        UserRepo::find_by_email(&self.pool, email)
            .await
            .map_err(map_db_error)
    }

    async fn insert(&self, input: &CreateUser) -> Result<Option<User>, CoreError> {
        UserRepo::create(&self.pool, input)
            .await
            .map_err(map_db_error)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, CoreError> {
        UserRepo::username_exists(&self.pool, username)
            .await
            .map_err(map_db_error)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, CoreError> {
        UserRepo::email_exists(&self.pool, email)
            .await
            .map_err(map_db_error)
    }
}

/// Map a sqlx error into the domain taxonomy.
///
/// A unique violation means a concurrent registration won the race for the
/// same username or email; everything else is a storage failure.
fn map_db_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            tracing::debug!(
                constraint = db_err.constraint().unwrap_or("unknown"),
                "Unique violation on insert"
            );
            return CoreError::Conflict(DUPLICATE_IDENTITY_MESSAGE.into());
        }
    }
    tracing::error!(error = %err, "Credential store error");
    CoreError::Internal(format!("Credential store error: {err}"))
}

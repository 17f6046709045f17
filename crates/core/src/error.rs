/// Service-wide error taxonomy.
///
/// `Unauthorized` carries the message shown to the client verbatim, so callers
/// must pass a constant that reveals nothing about which check failed.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

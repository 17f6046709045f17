/// Failure of the cache backend or of (de)serializing a cached value.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backend could not be reached or rejected the command.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A cached value could not be encoded or decoded as JSON.
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

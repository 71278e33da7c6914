use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by [`UrlStore`](crate::UrlStore) implementations.
///
/// The first four variants are expected outcomes that callers branch on. The
/// rest describe backend failures and are fatal to the operation that hit them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("url not found: {0}")]
    UrlNotFound(String),
    #[error("url is deleted: {0}")]
    UrlIsDeleted(String),
    /// A live record already maps the long URL. `short_id` is the canonical
    /// identifier the caller must use instead of the one it asked for.
    #[error("url already exists as {short_id}")]
    UrlAlreadyExists { short_id: String },
    #[error("short id already taken: {0}")]
    ShortIdTaken(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("storage constraint violated: {0}")]
    Constraint(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage io failed: {0}")]
    Io(String),
    #[error("storage serialization failed: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns the canonical short id carried by a dedup conflict.
    pub fn existing_short_id(&self) -> Option<&str> {
        match self {
            StoreError::UrlAlreadyExists { short_id } => Some(short_id),
            _ => None,
        }
    }

}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        StoreError::Io(value.to_string())
    }
}

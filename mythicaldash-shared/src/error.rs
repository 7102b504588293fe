/// Common error types for the persistence layer
///
/// Every store trait returns `StoreError`, regardless of whether the backing
/// implementation is PostgreSQL or the in-memory store.

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Referenced record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Store is temporarily unable to serve requests
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

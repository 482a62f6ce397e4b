//! Document store error types.

/// Errors that can occur during document store operations.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Document required by an update does not exist.
    #[error("Document not found: {path}")]
    NotFound { path: String },

    /// Document already exists where a create was requested.
    #[error("Document already exists: {path}")]
    AlreadyExists { path: String },

    /// Batch exceeds the per-commit operation ceiling.
    #[error("Batch of {size} operations exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    /// Stored payload is not a JSON object.
    #[error("Document at {path} is not a JSON object")]
    NotAnObject { path: String },

    /// Backend I/O failure.
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Failed to encode or decode a document.
    #[error("Document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Blocking task was cancelled.
    #[error("Blocking task cancelled")]
    TaskCancelled,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Result type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

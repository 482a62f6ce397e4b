//! Directory error types.

use crate::store::StoreError;

/// Errors that can occur during editor, credit, and award operations.
#[derive(thiserror::Error, Debug)]
pub enum DirectoryError {
    /// Requested record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Record with the same ID already exists.
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },

    /// Input failed validation.
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Failed to read an import file.
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DirectoryError {
    pub(crate) fn editor_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "Editor",
            id: id.to_string(),
        }
    }
}

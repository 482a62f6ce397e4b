//! Sync error types.

use crate::directory::DirectoryError;

/// Errors that can occur while syncing from provider feeds.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    /// Requested source is not one of the known providers.
    #[error("Unknown sync source '{0}'. Use one of: {accepted}", accepted = super::SyncTarget::ACCEPTED.join(", "))]
    UnknownSource(String),

    /// Provider feed could not be reached or returned garbage.
    #[error("Upstream service error from {source_name}: {message}")]
    Upstream {
        source_name: String,
        message: String,
    },

    /// Writing fetched records failed.
    #[error("Failed to import records from {source_name}: {source}")]
    Import {
        source_name: String,
        #[source]
        source: DirectoryError,
    },
}

impl SyncError {
    pub(crate) fn upstream(source_name: &str, message: impl Into<String>) -> Self {
        Self::Upstream {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    /// Whether the failure is confined to one provider and should be reported
    /// alongside the other sources' results rather than failing the run.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}

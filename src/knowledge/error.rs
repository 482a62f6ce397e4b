//! Knowledge error types.

use super::types::KnowledgeAction;
use crate::store::StoreError;

/// Errors that can occur while reading or mutating knowledge records.
#[derive(thiserror::Error, Debug)]
pub enum KnowledgeError {
    /// Editor ID cannot address a document.
    #[error("Invalid editor id '{0}'")]
    InvalidEditorId(String),

    /// Reading or creating the record failed.
    #[error("Failed to fetch knowledge for editor {editor_id}: {source}")]
    Fetch {
        editor_id: String,
        #[source]
        source: StoreError,
    },

    /// Writing the update failed.
    #[error("Failed to update knowledge for editor {editor_id}: {source}")]
    Update {
        editor_id: String,
        #[source]
        source: StoreError,
    },

    /// Record vanished between read and update.
    #[error("Knowledge record not found for editor {0}")]
    NotFound(String),

    /// Action name is not one of the accepted values.
    #[error("Invalid action '{0}'. Use '{update}' or '{regenerate}'", update = KnowledgeAction::ACCEPTED[0], regenerate = KnowledgeAction::ACCEPTED[1])]
    InvalidAction(String),

    /// Patch would leave the record malformed.
    #[error("Invalid knowledge patch: {0}")]
    InvalidPatch(String),
}

impl KnowledgeError {
    /// Whether the caller, not the store, is at fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEditorId(_) | Self::InvalidAction(_) | Self::InvalidPatch(_)
        )
    }
}

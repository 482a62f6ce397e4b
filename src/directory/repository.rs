//! Editor, credit, and award CRUD over the document store.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::DirectoryError;
use super::types::{
    validate_id, Award, Credit, Editor, EditorFilter, EditorProfile, NewAward, NewCredit,
    NewEditor,
};
use crate::store::{
    is_valid_field_path, to_fields, DocPath, Document, DocumentUpdate, Fields, SharedStore,
    StoreError, WriteBatch, AWARDS, CREDITS, EDITORS,
};

/// Fields callers may not change through an editor patch.
const IMMUTABLE_EDITOR_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// Path of an editor document.
#[must_use]
pub fn editor_path(editor_id: &str) -> DocPath {
    DocPath::new(EDITORS, editor_id)
}

/// Collection path of an editor's credits.
#[must_use]
pub fn credits_collection(editor_id: &str) -> String {
    editor_path(editor_id).subcollection(CREDITS)
}

/// Collection path of an editor's awards.
#[must_use]
pub fn awards_collection(editor_id: &str) -> String {
    editor_path(editor_id).subcollection(AWARDS)
}

/// ID of a credit or award in the flattened top-level mirror.
///
/// Record IDs are only unique per editor, so the mirror prefixes them.
#[must_use]
pub fn mirror_id(editor_id: &str, record_id: &str) -> String {
    format!("{editor_id}_{record_id}")
}

/// Decode documents, skipping any that do not match the record shape.
fn decode_all<T: DeserializeOwned>(collection: &str, docs: &[Document]) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match doc.decode() {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(collection = %collection, id = %doc.id, error = %e, "Skipping malformed document");
                None
            }
        })
        .collect()
}

/// Editor directory backed by a document store.
#[derive(Clone)]
pub struct DirectoryRepository {
    store: SharedStore,
}

impl DirectoryRepository {
    /// Create a repository over the given store.
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Create an editor, generating an ID when none is given.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for bad input and `AlreadyExists` if the ID is taken.
    pub async fn create_editor(&self, new: NewEditor) -> Result<Editor, DirectoryError> {
        new.validate()?;
        let id = new
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let editor = new.into_editor(id, Utc::now());

        self.store
            .create(&editor_path(&editor.id), to_fields(&editor)?)
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists { .. } => DirectoryError::AlreadyExists {
                    kind: "Editor",
                    id: editor.id.clone(),
                },
                other => other.into(),
            })?;

        tracing::info!(editor_id = %editor.id, name = %editor.name, "Created editor");
        Ok(editor)
    }

    /// Fetch an editor.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the editor does not exist.
    pub async fn get_editor(&self, editor_id: &str) -> Result<Editor, DirectoryError> {
        validate_id("editor", editor_id)?;
        let doc = self
            .store
            .get(&editor_path(editor_id))
            .await?
            .ok_or_else(|| DirectoryError::editor_not_found(editor_id))?;
        Ok(doc.decode()?)
    }

    /// Fetch an editor with their credits and awards.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the editor does not exist.
    pub async fn get_profile(&self, editor_id: &str) -> Result<EditorProfile, DirectoryError> {
        let editor = self.get_editor(editor_id).await?;
        let credits = self.credits_for(editor_id).await?;
        let awards = self.awards_for(editor_id).await?;
        Ok(EditorProfile {
            editor,
            credits,
            awards,
        })
    }

    /// Merge fields into an existing editor, stamping `updatedAt`.
    ///
    /// `id`, `createdAt`, and `updatedAt` in the patch are ignored.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the editor does not exist and `Invalid` if the
    /// patch would leave the record malformed.
    pub async fn update_editor(
        &self,
        editor_id: &str,
        mut patch: Fields,
    ) -> Result<Editor, DirectoryError> {
        let current = self.get_editor(editor_id).await?;
        for field in IMMUTABLE_EDITOR_FIELDS {
            patch.remove(field);
        }
        if let Some(key) = patch.keys().find(|key| !is_valid_field_path(key)) {
            return Err(DirectoryError::Invalid(format!(
                "field path '{key}' has an empty segment"
            )));
        }

        let update = DocumentUpdate::new(patch).server_timestamp("updatedAt");
        let mut merged = to_fields(&current)?;
        update.apply(&mut merged, Utc::now());
        serde_json::from_value::<Editor>(Value::Object(merged))
            .map_err(|e| DirectoryError::Invalid(e.to_string()))?;

        let path = editor_path(editor_id);
        self.store.update(&path, update).await.map_err(|e| match e {
            StoreError::NotFound { .. } => DirectoryError::editor_not_found(editor_id),
            other => other.into(),
        })?;

        tracing::info!(editor_id = %editor_id, "Updated editor");
        self.get_editor(editor_id).await
    }

    /// List editors matching the filter, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list_editors(&self, filter: &EditorFilter) -> Result<Vec<Editor>, DirectoryError> {
        let docs = match &filter.city {
            Some(city) => {
                self.store
                    .query_eq(EDITORS, "location.city", &Value::String(city.clone()))
                    .await?
            }
            None => self.store.list(EDITORS).await?,
        };

        let needle = filter.q.as_ref().map(|q| q.trim().to_lowercase());
        let mut editors: Vec<Editor> = decode_all::<Editor>(EDITORS, &docs)
            .into_iter()
            .filter(|editor| {
                filter
                    .state
                    .as_ref()
                    .map_or(true, |state| editor.location.state.eq_ignore_ascii_case(state))
            })
            .filter(|editor| {
                needle
                    .as_ref()
                    .map_or(true, |needle| editor.name.to_lowercase().contains(needle))
            })
            .collect();

        editors.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        if let Some(limit) = filter.limit {
            editors.truncate(limit);
        }
        Ok(editors)
    }

    /// Add a credit to an existing editor.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the editor does not exist.
    pub async fn add_credit(&self, editor_id: &str, new: NewCredit) -> Result<Credit, DirectoryError> {
        new.validate()?;
        self.get_editor(editor_id).await?;
        let credit = new.into_credit(editor_id);
        let fields = to_fields(&credit)?;

        let batch = WriteBatch::new()
            .set(DocPath::new(credits_collection(editor_id), &credit.id), fields.clone())
            .set(DocPath::new(CREDITS, mirror_id(editor_id, &credit.id)), fields);
        self.store.commit(batch).await?;

        tracing::info!(editor_id = %editor_id, credit_id = %credit.id, "Added credit");
        Ok(credit)
    }

    /// Add an award to an existing editor.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the editor does not exist.
    pub async fn add_award(&self, editor_id: &str, new: NewAward) -> Result<Award, DirectoryError> {
        new.validate()?;
        self.get_editor(editor_id).await?;
        let award = new.into_award(editor_id);
        let fields = to_fields(&award)?;

        let batch = WriteBatch::new()
            .set(DocPath::new(awards_collection(editor_id), &award.id), fields.clone())
            .set(DocPath::new(AWARDS, mirror_id(editor_id, &award.id)), fields);
        self.store.commit(batch).await?;

        tracing::info!(editor_id = %editor_id, award_id = %award.id, "Added award");
        Ok(award)
    }

    /// Credits recorded for an editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn credits_for(&self, editor_id: &str) -> Result<Vec<Credit>, DirectoryError> {
        let collection = credits_collection(editor_id);
        let docs = self.store.list(&collection).await?;
        Ok(decode_all(&collection, &docs))
    }

    /// Awards recorded for an editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn awards_for(&self, editor_id: &str) -> Result<Vec<Award>, DirectoryError> {
        let collection = awards_collection(editor_id);
        let docs = self.store.list(&collection).await?;
        Ok(decode_all(&collection, &docs))
    }
}

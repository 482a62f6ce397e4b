//! Lazy initialization and partial updates of knowledge records.

use chrono::Utc;

use super::error::KnowledgeError;
use super::types::{ActionOutcome, EditorKnowledge, KnowledgeAction};
use crate::store::{
    is_valid_field_path, to_fields, DocPath, Document, DocumentUpdate, Fields, SharedStore,
    StoreError, EDITOR_KNOWLEDGE,
};

/// Request fields that address the record rather than describe it.
const ENVELOPE_FIELDS: [&str; 2] = ["action", "editorId"];

/// Message returned for the reserved `regenerate` action.
pub const REGENERATE_UNAVAILABLE: &str = "Knowledge regeneration is not yet available";

/// Reads, lazily creates, and updates editor knowledge records.
#[derive(Clone)]
pub struct KnowledgeService {
    store: SharedStore,
}

impl KnowledgeService {
    /// Create a service over the given store.
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    fn path(editor_id: &str) -> Result<DocPath, KnowledgeError> {
        if editor_id.trim().is_empty() || editor_id.contains('/') {
            return Err(KnowledgeError::InvalidEditorId(editor_id.to_string()));
        }
        Ok(DocPath::new(EDITOR_KNOWLEDGE, editor_id))
    }

    fn decode(editor_id: &str, doc: &Document) -> Result<EditorKnowledge, KnowledgeError> {
        doc.decode().map_err(|source| KnowledgeError::Fetch {
            editor_id: editor_id.to_string(),
            source,
        })
    }

    /// Return the editor's knowledge record, creating a default one if absent.
    ///
    /// The boolean is `true` when this call persisted a new record. Two
    /// concurrent first reads may both write the default payload; the later
    /// write wins and both callers see a valid default record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEditorId` for unaddressable IDs and `Fetch` when the
    /// store cannot be read or written.
    pub async fn get_or_create(
        &self,
        editor_id: &str,
    ) -> Result<(EditorKnowledge, bool), KnowledgeError> {
        let path = Self::path(editor_id)?;
        let fetch_err = |source: StoreError| KnowledgeError::Fetch {
            editor_id: editor_id.to_string(),
            source,
        };

        if let Some(doc) = self.store.get(&path).await.map_err(fetch_err)? {
            return Ok((Self::decode(editor_id, &doc)?, false));
        }

        let knowledge = EditorKnowledge::new(Utc::now());
        let fields = to_fields(&knowledge).map_err(fetch_err)?;
        self.store.set(&path, fields).await.map_err(fetch_err)?;

        tracing::info!(editor_id = %editor_id, "Created default knowledge record");
        Ok((knowledge, true))
    }

    /// Merge caller-supplied fields into the editor's knowledge record.
    ///
    /// Top-level keys replace whole fields and dotted keys replace nested
    /// ones. `action` and `editorId` are ignored. `lastUpdated` is stamped by
    /// the store. A missing record is created with defaults first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPatch` if the merged record would not be a valid
    /// knowledge record, `Fetch` if the current record cannot be read, and
    /// `Update` if the write fails.
    pub async fn update(
        &self,
        editor_id: &str,
        mut patch: Fields,
    ) -> Result<EditorKnowledge, KnowledgeError> {
        let path = Self::path(editor_id)?;
        for field in ENVELOPE_FIELDS {
            patch.remove(field);
        }

        let (current, created) = self.get_or_create(editor_id).await?;
        if created {
            tracing::debug!(editor_id = %editor_id, "Update targeted a missing record; created defaults first");
        }
        Self::validate_patch(&current, &patch)?;

        let update_err = |source: StoreError| match source {
            StoreError::NotFound { .. } => KnowledgeError::NotFound(editor_id.to_string()),
            source => KnowledgeError::Update {
                editor_id: editor_id.to_string(),
                source,
            },
        };

        let fields_changed = patch.len();
        self.store
            .update(
                &path,
                DocumentUpdate::new(patch).server_timestamp("lastUpdated"),
            )
            .await
            .map_err(update_err)?;

        let doc = self
            .store
            .get(&path)
            .await
            .map_err(update_err)?
            .ok_or_else(|| KnowledgeError::NotFound(editor_id.to_string()))?;

        tracing::info!(editor_id = %editor_id, fields = fields_changed, "Updated knowledge record");
        Self::decode(editor_id, &doc)
    }

    /// Apply a named action from the knowledge POST route.
    ///
    /// `regenerate` never touches the store; it reports
    /// [`ActionOutcome::NotImplemented`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidAction` for names other than `update` and
    /// `regenerate`, and any error from [`KnowledgeService::update`].
    pub async fn apply_action(
        &self,
        editor_id: &str,
        action: &str,
        patch: Fields,
    ) -> Result<ActionOutcome, KnowledgeError> {
        let action = KnowledgeAction::parse(action)
            .ok_or_else(|| KnowledgeError::InvalidAction(action.to_string()))?;

        match action {
            KnowledgeAction::Update => {
                let knowledge = self.update(editor_id, patch).await?;
                Ok(ActionOutcome::Updated(Box::new(knowledge)))
            }
            KnowledgeAction::Regenerate => {
                Self::path(editor_id)?;
                tracing::debug!(editor_id = %editor_id, "Regenerate requested but not available");
                Ok(ActionOutcome::NotImplemented {
                    message: REGENERATE_UNAVAILABLE.to_string(),
                })
            }
        }
    }

    /// Check that applying `patch` to `current` yields a valid record.
    fn validate_patch(current: &EditorKnowledge, patch: &Fields) -> Result<(), KnowledgeError> {
        if let Some(key) = patch.keys().find(|key| !is_valid_field_path(key)) {
            return Err(KnowledgeError::InvalidPatch(format!(
                "field path '{key}' has an empty segment"
            )));
        }
        let mut merged = to_fields(current).map_err(|e| KnowledgeError::InvalidPatch(e.to_string()))?;
        DocumentUpdate::new(patch.clone())
            .server_timestamp("lastUpdated")
            .apply(&mut merged, Utc::now());

        let merged: EditorKnowledge = serde_json::from_value(serde_json::Value::Object(merged))
            .map_err(|e| KnowledgeError::InvalidPatch(e.to_string()))?;

        if !(0.0..=1.0).contains(&merged.completeness) {
            return Err(KnowledgeError::InvalidPatch(format!(
                "completeness must be within [0, 1], got {}",
                merged.completeness
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::knowledge::CareerStage;
    use crate::store::{DocumentStore, MemoryStore, StoreResult, WriteBatch};

    fn service() -> (KnowledgeService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (KnowledgeService::new(store.clone()), store)
    }

    fn patch(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    /// Store whose every operation fails.
    struct UnavailableStore;

    #[async_trait]
    impl DocumentStore for UnavailableStore {
        fn backend_name(&self) -> &'static str {
            "unavailable"
        }

        async fn get(&self, _path: &DocPath) -> StoreResult<Option<Document>> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn list(&self, _collection: &str) -> StoreResult<Vec<Document>> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn commit(&self, _batch: WriteBatch) -> StoreResult<()> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_get_or_create_creates_once() {
        let (service, store) = service();

        let (first, created) = service.get_or_create("ed-1").await.unwrap();
        assert!(created);
        assert!(first.is_unenriched());
        assert_eq!(store.count(EDITOR_KNOWLEDGE).await, 1);

        let (second, created) = service.get_or_create("ed-1").await.unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(store.count(EDITOR_KNOWLEDGE).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_reads_are_benign() {
        let (service, store) = service();

        let (a, b) = tokio::join!(service.get_or_create("ed-1"), service.get_or_create("ed-1"));

        assert!(a.unwrap().0.is_unenriched());
        assert!(b.unwrap().0.is_unenriched());
        assert_eq!(store.count(EDITOR_KNOWLEDGE).await, 1);
    }

    #[tokio::test]
    async fn test_invalid_editor_ids() {
        let (service, _store) = service();

        for id in ["", "  ", "a/b"] {
            let err = service.get_or_create(id).await.unwrap_err();
            assert!(matches!(err, KnowledgeError::InvalidEditorId(_)), "id {id:?}");
        }
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_fetch_error() {
        let service = KnowledgeService::new(Arc::new(UnavailableStore));

        let err = service.get_or_create("ed-1").await.unwrap_err();

        assert!(matches!(err, KnowledgeError::Fetch { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_update_overwrites_only_patched_fields() {
        let (service, _store) = service();
        let (before, _) = service.get_or_create("ed-1").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let after = service
            .update(
                "ed-1",
                patch(json!({
                    "action": "update",
                    "editorId": "ed-1",
                    "completeness": 0.4,
                    "summary.careerStage": "veteran",
                    "risks": [{"kind": "availability"}]
                })),
            )
            .await
            .unwrap();

        assert!((after.completeness - 0.4).abs() < f64::EPSILON);
        assert_eq!(after.summary.career_stage, CareerStage::Veteran);
        assert_eq!(after.risks.len(), 1);
        assert_eq!(after.summary.availability_pattern, before.summary.availability_pattern);
        assert_eq!(after.metrics, before.metrics);
        assert!(after.last_updated > before.last_updated);
    }

    #[tokio::test]
    async fn test_update_ignores_caller_timestamp() {
        let (service, _store) = service();
        service.get_or_create("ed-1").await.unwrap();

        let after = service
            .update("ed-1", patch(json!({"lastUpdated": "1999-01-01T00:00:00Z"})))
            .await
            .unwrap();

        assert!(after.last_updated.timestamp() > 946_684_800);
    }

    #[tokio::test]
    async fn test_update_creates_missing_record() {
        let (service, store) = service();

        let knowledge = service
            .update("new-editor", patch(json!({"summary.strengths": ["documentary"]})))
            .await
            .unwrap();

        assert_eq!(knowledge.summary.strengths, vec!["documentary"]);
        assert_eq!(store.count(EDITOR_KNOWLEDGE).await, 1);
    }

    #[tokio::test]
    async fn test_update_rejects_malformed_patch() {
        let (service, _store) = service();
        let (before, _) = service.get_or_create("ed-1").await.unwrap();

        let err = service
            .update("ed-1", patch(json!({"summary.careerStage": "legend"})))
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::InvalidPatch(_)));

        let err = service
            .update("ed-1", patch(json!({"completeness": 1.5})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("completeness"));

        let (unchanged, _) = service.get_or_create("ed-1").await.unwrap();
        assert_eq!(unchanged, before);
    }

    #[tokio::test]
    async fn test_update_rejects_empty_path_segments() {
        let (service, store) = service();
        let (before, _) = service.get_or_create("ed-1").await.unwrap();

        for key in ["summary.", "", ".completeness", "summary..careerStage"] {
            let mut fields = Fields::new();
            fields.insert(key.to_string(), json!("veteran"));
            let err = service.update("ed-1", fields).await.unwrap_err();
            assert!(matches!(err, KnowledgeError::InvalidPatch(_)), "key {key:?}");
        }

        let stored = store
            .get(&DocPath::new(EDITOR_KNOWLEDGE, "ed-1"))
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.data.contains_key(""));
        assert!(!stored.data["summary"].as_object().unwrap().contains_key(""));
        let (unchanged, _) = service.get_or_create("ed-1").await.unwrap();
        assert_eq!(unchanged, before);
    }

    #[tokio::test]
    async fn test_regenerate_does_not_touch_store() {
        let service = KnowledgeService::new(Arc::new(UnavailableStore));

        let outcome = service
            .apply_action("ed-1", "regenerate", Fields::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ActionOutcome::NotImplemented {
                message: REGENERATE_UNAVAILABLE.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_action_rejected() {
        let (service, store) = service();

        let err = service
            .apply_action("ed-1", "delete-everything", Fields::new())
            .await
            .unwrap_err();

        assert!(matches!(err, KnowledgeError::InvalidAction(_)));
        assert_eq!(store.count(EDITOR_KNOWLEDGE).await, 0);
    }
}

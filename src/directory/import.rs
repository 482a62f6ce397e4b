//! Bulk import of editor bundles from JSON files and provider feeds.

use std::collections::HashSet;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use super::error::DirectoryError;
use super::repository::{awards_collection, credits_collection, editor_path, mirror_id};
use super::types::{validate_id, EditorBundle};
use crate::store::{
    to_fields, BatchWriter, DocPath, DocumentUpdate, Fields, SharedStore, WriteOp, AWARDS,
    CREDITS, MAX_BATCH_OPS,
};

/// Counts reported by an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub editors_processed: usize,
    pub editors_added: usize,
    pub editors_updated: usize,
    pub credits_added: usize,
    pub awards_added: usize,
    /// Bundles that were skipped, with the reason.
    pub errors: Vec<String>,
}

impl ImportStats {
    /// Fold another run's counts into this one.
    pub fn absorb(&mut self, other: ImportStats) {
        self.editors_processed += other.editors_processed;
        self.editors_added += other.editors_added;
        self.editors_updated += other.editors_updated;
        self.credits_added += other.credits_added;
        self.awards_added += other.awards_added;
        self.errors.extend(other.errors);
    }
}

/// Upserts editor bundles into the store in bounded batches.
#[derive(Clone)]
pub struct Importer {
    store: SharedStore,
    batch_size: usize,
}

/// Records already written or seen during one run.
#[derive(Default)]
struct RunState {
    editors: HashSet<String>,
    subrecords: HashSet<String>,
}

impl Importer {
    /// Create an importer over the given store.
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            batch_size: MAX_BATCH_OPS,
        }
    }

    /// Set the operations per batch commit (builder pattern).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Import a JSON file holding an array of bundles, or `{"editors": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a bundle list, or
    /// a batch commit fails. Individual malformed bundles are reported in
    /// [`ImportStats::errors`] instead.
    pub async fn import_file(&self, path: &Path) -> Result<ImportStats, DirectoryError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DirectoryError::ReadFile {
                path: path.display().to_string(),
                source,
            })?;
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| DirectoryError::Invalid(format!("{}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), "Importing editor file");
        self.import_value(value).await
    }

    /// Import a parsed bundle list.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the value is not a list of bundles, or a store
    /// error if a batch commit fails.
    pub async fn import_value(&self, value: Value) -> Result<ImportStats, DirectoryError> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("editors") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(DirectoryError::Invalid(
                        "expected an array of editors or an object with an 'editors' array"
                            .to_string(),
                    ))
                }
            },
            _ => {
                return Err(DirectoryError::Invalid(
                    "expected an array of editors".to_string(),
                ))
            }
        };

        let mut stats = ImportStats::default();
        let mut bundles = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match EditorBundle::from_value(item) {
                Ok(bundle) => bundles.push(bundle),
                Err(e) => stats.errors.push(format!("entry {index}: {e}")),
            }
        }

        stats.absorb(self.import_bundles(bundles).await?);
        Ok(stats)
    }

    /// Upsert typed bundles.
    ///
    /// # Errors
    ///
    /// Returns a store error if reading existing records or a batch commit fails.
    pub async fn import_bundles(
        &self,
        bundles: Vec<EditorBundle>,
    ) -> Result<ImportStats, DirectoryError> {
        let mut stats = ImportStats::default();
        let mut run = RunState::default();
        let mut writer = BatchWriter::new(self.store.as_ref(), self.batch_size);

        for bundle in bundles {
            let label = bundle.editor.name.clone();
            if let Err(e) = self.import_one(bundle, &mut writer, &mut run, &mut stats).await {
                match e {
                    DirectoryError::Invalid(reason) => {
                        stats.errors.push(format!("{label}: {reason}"));
                    }
                    other => return Err(other),
                }
            }
        }

        let (batches, ops) = writer.finish().await?;
        tracing::info!(
            processed = stats.editors_processed,
            added = stats.editors_added,
            updated = stats.editors_updated,
            credits = stats.credits_added,
            awards = stats.awards_added,
            skipped = stats.errors.len(),
            batches,
            ops,
            "Import finished"
        );
        Ok(stats)
    }

    async fn import_one(
        &self,
        bundle: EditorBundle,
        writer: &mut BatchWriter<'_>,
        run: &mut RunState,
        stats: &mut ImportStats,
    ) -> Result<(), DirectoryError> {
        let EditorBundle {
            editor,
            credits,
            awards,
            provided,
        } = bundle;
        editor.validate()?;
        for credit in &credits {
            credit.validate()?;
        }
        for award in &awards {
            award.validate()?;
        }

        let editor_id = editor.resolved_id();
        validate_id("editor", &editor_id)?;
        let path = editor_path(&editor_id);
        stats.editors_processed += 1;

        let exists =
            run.editors.contains(&editor_id) || self.store.get(&path).await?.is_some();
        if exists {
            let record = to_fields(&editor.into_editor(editor_id.clone(), Utc::now()))?;
            let fields = merge_fields(&record, provided.as_ref());
            writer
                .push(WriteOp::Update {
                    path,
                    update: DocumentUpdate::new(fields).server_timestamp("updatedAt"),
                })
                .await?;
            stats.editors_updated += 1;
        } else {
            let record = editor.into_editor(editor_id.clone(), Utc::now());
            writer
                .push(WriteOp::Set {
                    path,
                    data: to_fields(&record)?,
                })
                .await?;
            stats.editors_added += 1;
        }
        run.editors.insert(editor_id.clone());

        let known_credits = self.existing_ids(&credits_collection(&editor_id), exists).await?;
        for credit in credits {
            let credit = credit.into_credit(&editor_id);
            let key = format!("{}/{}", credits_collection(&editor_id), credit.id);
            if known_credits.contains(&credit.id) || !run.subrecords.insert(key) {
                continue;
            }
            let fields = to_fields(&credit)?;
            writer
                .push(WriteOp::Set {
                    path: DocPath::new(credits_collection(&editor_id), &credit.id),
                    data: fields.clone(),
                })
                .await?;
            writer
                .push(WriteOp::Set {
                    path: DocPath::new(CREDITS, mirror_id(&editor_id, &credit.id)),
                    data: fields,
                })
                .await?;
            stats.credits_added += 1;
        }

        let known_awards = self.existing_ids(&awards_collection(&editor_id), exists).await?;
        for award in awards {
            let award = award.into_award(&editor_id);
            let key = format!("{}/{}", awards_collection(&editor_id), award.id);
            if known_awards.contains(&award.id) || !run.subrecords.insert(key) {
                continue;
            }
            let fields = to_fields(&award)?;
            writer
                .push(WriteOp::Set {
                    path: DocPath::new(awards_collection(&editor_id), &award.id),
                    data: fields.clone(),
                })
                .await?;
            writer
                .push(WriteOp::Set {
                    path: DocPath::new(AWARDS, mirror_id(&editor_id, &award.id)),
                    data: fields,
                })
                .await?;
            stats.awards_added += 1;
        }

        Ok(())
    }

    async fn existing_ids(
        &self,
        collection: &str,
        editor_exists: bool,
    ) -> Result<HashSet<String>, DirectoryError> {
        if !editor_exists {
            return Ok(HashSet::new());
        }
        let docs = self.store.list(collection).await?;
        Ok(docs.into_iter().map(|doc| doc.id).collect())
    }
}

/// Stored fields that an import never overwrites.
const IMMUTABLE_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// Update fields for an existing editor, limited to what the input supplied.
///
/// `record` is the normalized editor. Supplied objects are merged one level
/// deep, so `professional: {union}` leaves the other professional fields
/// alone. Without `provided` every field of `record` is written.
fn merge_fields(record: &Fields, provided: Option<&Fields>) -> Fields {
    let mut fields = Fields::new();
    let Some(provided) = provided else {
        for (key, value) in record {
            if !IMMUTABLE_FIELDS.contains(&key.as_str()) {
                fields.insert(key.clone(), value.clone());
            }
        }
        return fields;
    };

    for (key, raw) in provided {
        if IMMUTABLE_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let Some(value) = record.get(key) else {
            continue;
        };
        match (raw, value) {
            (Value::Object(supplied), Value::Object(normalized)) => {
                for sub in supplied.keys() {
                    if let Some(sub_value) = normalized.get(sub) {
                        fields.insert(format!("{key}.{sub}"), sub_value.clone());
                    }
                }
            }
            _ => {
                fields.insert(key.clone(), value.clone());
            }
        }
    }
    fields
}

//! Document addressing, field paths, and write batches.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::error::{StoreError, StoreResult};

/// Maximum number of operations accepted in a single batch commit.
pub const MAX_BATCH_OPS: usize = 500;

/// Field map of a stored document.
pub type Fields = serde_json::Map<String, Value>;

/// Address of a document: collection path plus document ID.
///
/// Collection paths may be nested (`editors/ed-1/credits`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    collection: String,
    id: String,
}

impl DocPath {
    /// Create a document path.
    #[must_use]
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Collection path this document lives in.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Document ID within the collection.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Path of a subcollection nested under this document.
    #[must_use]
    pub fn subcollection(&self, name: &str) -> String {
        format!("{}/{}/{name}", self.collection, self.id)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document ID.
    pub id: String,
    /// Document fields.
    pub data: Fields,
}

impl Document {
    /// Create a document.
    #[must_use]
    pub fn new(id: impl Into<String>, data: Fields) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Look up a field by dotted path.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&Value> {
        get_field_path(&self.data, path)
    }

    /// Look up a string field by dotted path.
    #[must_use]
    pub fn str_field(&self, path: &str) -> Option<&str> {
        self.field(path).and_then(Value::as_str)
    }

    /// Deserialize the document into a typed record.
    ///
    /// # Errors
    ///
    /// Returns an error if the fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }
}

/// Serialize a record into a document field map.
///
/// # Errors
///
/// Returns an error if the value does not serialize to a JSON object.
pub fn to_fields<T: Serialize>(value: &T) -> StoreResult<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject {
            path: std::any::type_name::<T>().to_string(),
        }),
    }
}

/// Format a timestamp the way stored documents carry it.
#[must_use]
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Read a value at a dotted field path.
#[must_use]
pub fn get_field_path<'a>(fields: &'a Fields, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = fields.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Whether every segment of a dotted field path is non-empty.
#[must_use]
pub fn is_valid_field_path(path: &str) -> bool {
    path.split('.').all(|part| !part.trim().is_empty())
}

/// Write a value at a dotted field path, creating intermediate maps.
///
/// Intermediate values that are not objects are replaced.
pub fn set_field_path(fields: &mut Fields, path: &str, value: Value) {
    let mut parts: Vec<&str> = path.split('.').collect();
    let Some(last) = parts.pop() else {
        return;
    };
    let mut current = fields;
    for part in parts {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Fields::new()));
        if !entry.is_object() {
            *entry = Value::Object(Fields::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(last.to_string(), value);
}

/// A partial update: field overwrites plus fields stamped with the store clock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentUpdate {
    fields: Fields,
    server_timestamps: Vec<String>,
}

impl DocumentUpdate {
    /// Create an update from top-level or dotted field overwrites.
    #[must_use]
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    /// Overwrite a single field (builder pattern).
    #[must_use]
    pub fn set(mut self, path: impl Into<String>, value: Value) -> Self {
        self.fields.insert(path.into(), value);
        self
    }

    /// Stamp a field with the store's clock at commit time (builder pattern).
    #[must_use]
    pub fn server_timestamp(mut self, path: impl Into<String>) -> Self {
        self.server_timestamps.push(path.into());
        self
    }

    /// Field overwrites in this update.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.server_timestamps.is_empty()
    }

    /// Apply the update to a field map using `now` for server timestamps.
    pub fn apply(&self, target: &mut Fields, now: DateTime<Utc>) {
        for (path, value) in &self.fields {
            set_field_path(target, path, value.clone());
        }
        for path in &self.server_timestamps {
            set_field_path(target, path, timestamp_value(now));
        }
    }
}

/// A single mutation inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Write a document only if it does not exist yet.
    Create { path: DocPath, data: Fields },
    /// Write a document, replacing any existing content.
    Set { path: DocPath, data: Fields },
    /// Merge into an existing document.
    Update { path: DocPath, update: DocumentUpdate },
    /// Remove a document. Missing documents are ignored.
    Delete { path: DocPath },
}

impl WriteOp {
    /// Path the operation targets.
    #[must_use]
    pub fn path(&self) -> &DocPath {
        match self {
            Self::Create { path, .. }
            | Self::Set { path, .. }
            | Self::Update { path, .. }
            | Self::Delete { path } => path,
        }
    }
}

/// Group of mutations committed as one atomic unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a create-if-absent write.
    #[must_use]
    pub fn create(mut self, path: DocPath, data: Fields) -> Self {
        self.ops.push(WriteOp::Create { path, data });
        self
    }

    /// Add a full document write.
    #[must_use]
    pub fn set(mut self, path: DocPath, data: Fields) -> Self {
        self.ops.push(WriteOp::Set { path, data });
        self
    }

    /// Add a merge into an existing document.
    #[must_use]
    pub fn update(mut self, path: DocPath, update: DocumentUpdate) -> Self {
        self.ops.push(WriteOp::Update { path, update });
        self
    }

    /// Add a delete.
    #[must_use]
    pub fn delete(mut self, path: DocPath) -> Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    /// Push an operation in place.
    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    /// Number of operations in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the batch has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Operations in insertion order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consume the batch, returning its operations.
    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Check the batch against the commit ceiling.
    ///
    /// # Errors
    ///
    /// Returns `BatchTooLarge` if the batch exceeds [`MAX_BATCH_OPS`].
    pub fn ensure_within_limit(&self) -> StoreResult<()> {
        if self.ops.len() > MAX_BATCH_OPS {
            return Err(StoreError::BatchTooLarge {
                size: self.ops.len(),
                limit: MAX_BATCH_OPS,
            });
        }
        Ok(())
    }
}

/// Whether a document field equals the given value.
#[must_use]
pub fn field_equals(fields: &Fields, path: &str, value: &Value) -> bool {
    get_field_path(fields, path) == Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_doc_path_display_and_subcollection() {
        let path = DocPath::new("editors", "ed-1");
        assert_eq!(path.to_string(), "editors/ed-1");
        assert_eq!(path.subcollection("credits"), "editors/ed-1/credits");
    }

    #[test]
    fn test_field_path_segments_must_be_named() {
        assert!(is_valid_field_path("completeness"));
        assert!(is_valid_field_path("summary.careerStage"));
        assert!(!is_valid_field_path(""));
        assert!(!is_valid_field_path("summary."));
        assert!(!is_valid_field_path(".summary"));
        assert!(!is_valid_field_path("summary..careerStage"));
        assert!(!is_valid_field_path(" "));
    }

    #[test]
    fn test_get_field_path_nested() {
        let data = fields(json!({"location": {"city": "Burbank"}}));
        assert_eq!(get_field_path(&data, "location.city"), Some(&json!("Burbank")));
        assert!(get_field_path(&data, "location.state").is_none());
        assert!(get_field_path(&data, "location.city.zip").is_none());
    }

    #[test]
    fn test_set_field_path_creates_and_replaces() {
        let mut data = fields(json!({"summary": "flat"}));
        set_field_path(&mut data, "summary.careerStage", json!("veteran"));
        set_field_path(&mut data, "metrics.collaboration.rating", json!(4.5));

        assert_eq!(data["summary"]["careerStage"], "veteran");
        assert_eq!(data["metrics"]["collaboration"]["rating"], 4.5);
    }

    #[test]
    fn test_update_apply_leaves_siblings() {
        let mut data = fields(json!({
            "summary": {"careerStage": "emerging", "strengths": ["pacing"]},
            "completeness": 0.0
        }));
        let now = Utc::now();
        DocumentUpdate::new(fields(json!({"summary.careerStage": "established"})))
            .server_timestamp("lastUpdated")
            .apply(&mut data, now);

        assert_eq!(data["summary"]["careerStage"], "established");
        assert_eq!(data["summary"]["strengths"], json!(["pacing"]));
        assert_eq!(data["lastUpdated"], timestamp_value(now));
    }

    #[test]
    fn test_batch_limit() {
        let mut batch = WriteBatch::new();
        for i in 0..=MAX_BATCH_OPS {
            batch.push(WriteOp::Delete {
                path: DocPath::new("editors", format!("ed-{i}")),
            });
        }
        assert!(matches!(
            batch.ensure_within_limit(),
            Err(StoreError::BatchTooLarge { size: 501, limit: 500 })
        ));
    }

    #[test]
    fn test_to_fields_rejects_non_object() {
        assert!(to_fields(&42).is_err());
        assert!(to_fields(&json!({"a": 1})).is_ok());
    }
}

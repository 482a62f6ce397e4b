//! Document store abstraction.
//!
//! Documents are schemaless JSON objects addressed by collection path and
//! ID. Every mutation goes through [`DocumentStore::commit`], which applies a
//! [`WriteBatch`] atomically and rejects batches above [`MAX_BATCH_OPS`].

mod document;
mod error;
mod memory;
mod sqlite;
mod writer;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use document::{
    field_equals, get_field_path, is_valid_field_path, set_field_path, timestamp_value, to_fields,
    DocPath, Document, DocumentUpdate, Fields, WriteBatch, WriteOp, MAX_BATCH_OPS,
};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, SCHEMA};
pub use writer::BatchWriter;

use crate::config::{StoreBackend, StoreConfig};

/// Collection holding editor profiles.
pub const EDITORS: &str = "editors";
/// Flattened mirror of every editor's credits.
pub const CREDITS: &str = "credits";
/// Flattened mirror of every editor's awards.
pub const AWARDS: &str = "awards";
/// Collection holding one knowledge record per editor.
pub const EDITOR_KNOWLEDGE: &str = "editorKnowledge";

/// A schemaless key-document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short name of the backend, for logs.
    fn backend_name(&self) -> &'static str;

    /// Read a document, `None` if absent.
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Document>>;

    /// List every document in a collection, ordered by ID.
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Apply a batch of writes atomically.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Write a document only if it does not exist yet.
    async fn create(&self, path: &DocPath, data: Fields) -> StoreResult<()> {
        self.commit(WriteBatch::new().create(path.clone(), data)).await
    }

    /// Write a document, replacing any existing content.
    async fn set(&self, path: &DocPath, data: Fields) -> StoreResult<()> {
        self.commit(WriteBatch::new().set(path.clone(), data)).await
    }

    /// Merge into an existing document; `NotFound` if it does not exist.
    async fn update(&self, path: &DocPath, update: DocumentUpdate) -> StoreResult<()> {
        self.commit(WriteBatch::new().update(path.clone(), update))
            .await
    }

    /// Remove a document. Subcollections are left in place.
    async fn delete(&self, path: &DocPath) -> StoreResult<()> {
        self.commit(WriteBatch::new().delete(path.clone())).await
    }

    /// Documents whose field at `field` (dotted path) equals `value`.
    async fn query_eq(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<Document>> {
        let docs = self.list(collection).await?;
        Ok(docs
            .into_iter()
            .filter(|doc| field_equals(&doc.data, field, value))
            .collect())
    }
}

/// Shared handle to a document store.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Open the store described by the configuration.
///
/// # Errors
///
/// Returns an error if the `SQLite` database cannot be opened.
pub async fn open_store(config: &StoreConfig) -> StoreResult<SharedStore> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data will not persist");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(&config.path).await?;
            Ok(Arc::new(store))
        }
    }
}

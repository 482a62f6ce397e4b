//! In-memory document store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::document::{DocPath, Document, Fields, WriteBatch, WriteOp};
use super::error::{StoreError, StoreResult};
use super::DocumentStore;

type Collections = HashMap<String, BTreeMap<String, Fields>>;

/// Document store kept entirely in process memory.
///
/// A batch is staged per touched document and applied only when every
/// operation succeeds, so a failed commit leaves the store untouched.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

/// Documents touched by a batch; `None` marks a delete.
type Staged = HashMap<DocPath, Option<Fields>>;

/// Current content of a document, looking at staged writes first.
fn current<'a>(collections: &'a Collections, staged: &'a Staged, path: &DocPath) -> Option<&'a Fields> {
    match staged.get(path) {
        Some(entry) => entry.as_ref(),
        None => collections
            .get(path.collection())
            .and_then(|docs| docs.get(path.id())),
    }
}

fn stage_op(
    collections: &Collections,
    staged: &mut Staged,
    op: WriteOp,
    now: chrono::DateTime<Utc>,
) -> StoreResult<()> {
    match op {
        WriteOp::Create { path, data } => {
            if current(collections, staged, &path).is_some() {
                return Err(StoreError::AlreadyExists {
                    path: path.to_string(),
                });
            }
            staged.insert(path, Some(data));
        }
        WriteOp::Set { path, data } => {
            staged.insert(path, Some(data));
        }
        WriteOp::Update { path, update } => {
            let mut doc = current(collections, staged, &path)
                .cloned()
                .ok_or_else(|| StoreError::NotFound {
                    path: path.to_string(),
                })?;
            update.apply(&mut doc, now);
            staged.insert(path, Some(doc));
        }
        WriteOp::Delete { path } => {
            staged.insert(path, None);
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(path.collection())
            .and_then(|docs| docs.get(path.id()))
            .map(|data| Document::new(path.id(), data.clone())))
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        batch.ensure_within_limit()?;
        if batch.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut collections = self.collections.write().await;
        let mut staged = Staged::new();
        for op in batch.into_ops() {
            stage_op(&collections, &mut staged, op, now)?;
        }

        for (path, doc) in staged {
            match doc {
                Some(data) => {
                    collections
                        .entry(path.collection().to_string())
                        .or_default()
                        .insert(path.id().to_string(), data);
                }
                None => {
                    if let Some(docs) = collections.get_mut(path.collection()) {
                        docs.remove(path.id());
                    }
                }
            }
        }
        Ok(())
    }
}

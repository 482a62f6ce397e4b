//! Sequential batch writer that respects the per-commit ceiling.

use super::document::{WriteBatch, WriteOp, MAX_BATCH_OPS};
use super::error::StoreResult;
use super::DocumentStore;

/// Accumulates writes and commits them in bounded batches.
///
/// Each batch is committed and awaited before the next one is started.
pub struct BatchWriter<'a> {
    store: &'a dyn DocumentStore,
    limit: usize,
    batch: WriteBatch,
    batches_committed: usize,
    ops_committed: usize,
}

impl<'a> BatchWriter<'a> {
    /// Create a writer flushing every `limit` operations (clamped to `1..=MAX_BATCH_OPS`).
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore, limit: usize) -> Self {
        Self {
            store,
            limit: limit.clamp(1, MAX_BATCH_OPS),
            batch: WriteBatch::new(),
            batches_committed: 0,
            ops_committed: 0,
        }
    }

    /// Effective operations per batch.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Queue an operation, committing the batch once it is full.
    ///
    /// # Errors
    ///
    /// Returns any error from committing a full batch.
    pub async fn push(&mut self, op: WriteOp) -> StoreResult<()> {
        self.batch.push(op);
        if self.batch.len() >= self.limit {
            self.flush().await?;
        }
        Ok(())
    }

    /// Commit whatever is queued.
    ///
    /// # Errors
    ///
    /// Returns any error from the store commit.
    pub async fn flush(&mut self) -> StoreResult<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.batch);
        let size = batch.len();
        self.store.commit(batch).await?;
        self.batches_committed += 1;
        self.ops_committed += size;
        tracing::debug!(
            batch = self.batches_committed,
            ops = size,
            backend = self.store.backend_name(),
            "Committed write batch"
        );
        Ok(())
    }

    /// Commit the remainder and return `(batches, operations)` committed.
    ///
    /// # Errors
    ///
    /// Returns any error from the final commit.
    pub async fn finish(mut self) -> StoreResult<(usize, usize)> {
        self.flush().await?;
        Ok((self.batches_committed, self.ops_committed))
    }
}

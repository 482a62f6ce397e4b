//! Scans the editors collection and deletes records flagged by the rules.

use serde::Serialize;
use serde_json::json;

use super::rules::{CleanupRules, MatchReason};
use crate::config::{CleanupConfig, DEFAULT_CLEANUP_BATCH_SIZE};
use crate::directory::{awards_collection, credits_collection, editor_path};
use crate::store::{BatchWriter, DocPath, SharedStore, StoreResult, WriteOp, AWARDS, CREDITS, EDITORS};

/// An editor the rules flagged for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupCandidate {
    pub id: String,
    pub name: Option<String>,
    pub reason: MatchReason,
}

/// Outcome of a cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    /// Editor documents examined.
    pub scanned: usize,
    /// Editor documents removed.
    pub deleted: usize,
    /// Credit and award documents removed alongside them.
    pub subrecords_deleted: usize,
    pub batches_committed: usize,
    pub dry_run: bool,
    pub candidates: Vec<CleanupCandidate>,
}

/// Deletes mock editors and everything hanging off them.
pub struct CleanupEngine {
    store: SharedStore,
    rules: CleanupRules,
    batch_size: usize,
}

impl CleanupEngine {
    #[must_use]
    pub fn new(store: SharedStore, rules: CleanupRules) -> Self {
        Self {
            store,
            rules,
            batch_size: DEFAULT_CLEANUP_BATCH_SIZE,
        }
    }

    /// Build an engine from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the synthetic ID prefixes do not form a valid pattern.
    pub fn from_config(store: SharedStore, config: &CleanupConfig) -> Result<Self, regex::Error> {
        Ok(Self::new(store, CleanupRules::from_config(config)?).with_batch_size(config.batch_size))
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Classify every editor without writing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the editors collection cannot be read.
    pub async fn scan(&self) -> StoreResult<(usize, Vec<CleanupCandidate>)> {
        let editors = self.store.list(EDITORS).await?;
        let scanned = editors.len();
        let candidates = editors
            .iter()
            .filter_map(|doc| {
                self.rules.classify(doc).map(|reason| CleanupCandidate {
                    id: doc.id.clone(),
                    name: doc.str_field("name").map(str::to_string),
                    reason,
                })
            })
            .collect();
        Ok((scanned, candidates))
    }

    /// Scan and, unless `dry_run`, delete every candidate.
    ///
    /// Deletes are committed in sequential batches. A failure stops the run;
    /// batches already committed stay committed.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    pub async fn run(&self, dry_run: bool) -> StoreResult<CleanupReport> {
        let (scanned, candidates) = self.scan().await?;
        tracing::info!(scanned, matched = candidates.len(), dry_run, "Cleanup scan complete");

        let mut report = CleanupReport {
            scanned,
            dry_run,
            ..CleanupReport::default()
        };

        if dry_run || candidates.is_empty() {
            report.candidates = candidates;
            return Ok(report);
        }

        let mut writer = BatchWriter::new(self.store.as_ref(), self.batch_size);
        for candidate in &candidates {
            tracing::debug!(
                editor_id = %candidate.id,
                reason = candidate.reason.description(),
                "Deleting mock editor"
            );
            for path in self.subrecord_paths(&candidate.id).await? {
                writer.push(WriteOp::Delete { path }).await?;
                report.subrecords_deleted += 1;
            }
            writer
                .push(WriteOp::Delete {
                    path: editor_path(&candidate.id),
                })
                .await?;
            report.deleted += 1;
        }
        let (batches, _) = writer.finish().await?;
        report.batches_committed = batches;
        report.candidates = candidates;

        tracing::info!(
            deleted = report.deleted,
            subrecords = report.subrecords_deleted,
            batches,
            "Cleanup complete"
        );
        Ok(report)
    }

    /// Credits and awards under the editor plus their mirror rows.
    async fn subrecord_paths(&self, editor_id: &str) -> StoreResult<Vec<DocPath>> {
        let mut paths = Vec::new();
        for collection in [credits_collection(editor_id), awards_collection(editor_id)] {
            for doc in self.store.list(&collection).await? {
                paths.push(DocPath::new(collection.clone(), doc.id));
            }
        }
        let owner = json!(editor_id);
        for collection in [CREDITS, AWARDS] {
            for doc in self.store.query_eq(collection, "editorId", &owner).await? {
                paths.push(DocPath::new(collection, doc.id));
            }
        }
        Ok(paths)
    }
}

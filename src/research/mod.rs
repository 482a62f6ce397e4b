//! Auto-research trigger.
//!
//! Walks the editors collection, makes sure every editor has a knowledge
//! record, and reports the editors whose records are not complete enough
//! yet. Gathering the research itself happens elsewhere.

use serde::{Deserialize, Serialize};

use crate::config::{Environment, ResearchConfig};
use crate::knowledge::{KnowledgeError, KnowledgeService};
use crate::store::{SharedStore, StoreError, EDITORS};

/// Body of an auto-gather request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoGatherRequest {
    #[serde(default)]
    pub max_editors: Option<usize>,
    #[serde(default)]
    pub min_completeness: Option<f64>,
}

/// Outcome of an auto-gather run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoGatherReport {
    pub editors_scanned: usize,
    pub knowledge_created: usize,
    /// Editors with nothing learned about them yet.
    pub unenriched: usize,
    /// Editor IDs whose completeness is below the threshold.
    pub pending_research: Vec<String>,
}

/// Errors that can occur during an auto-gather run.
#[derive(thiserror::Error, Debug)]
pub enum ResearchError {
    #[error("Failed to list editors: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),

    #[error("minCompleteness must be within [0, 1], got {0}")]
    InvalidThreshold(f64),
}

/// Guarantees knowledge records and reports research gaps.
#[derive(Clone)]
pub struct AutoResearch {
    store: SharedStore,
    knowledge: KnowledgeService,
    min_completeness: f64,
}

impl AutoResearch {
    #[must_use]
    pub fn new(store: SharedStore, config: &ResearchConfig) -> Self {
        Self {
            knowledge: KnowledgeService::new(store.clone()),
            store,
            min_completeness: config.min_completeness,
        }
    }

    /// Scan editors and ensure each has a knowledge record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidThreshold` for a threshold outside `[0, 1]`, or the
    /// first store failure.
    pub async fn run(&self, request: &AutoGatherRequest) -> Result<AutoGatherReport, ResearchError> {
        let threshold = request.min_completeness.unwrap_or(self.min_completeness);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ResearchError::InvalidThreshold(threshold));
        }

        let editors = self.store.list(EDITORS).await?;
        let limit = request.max_editors.unwrap_or(editors.len());

        let mut report = AutoGatherReport::default();
        for doc in editors.iter().take(limit) {
            let (knowledge, created) = self.knowledge.get_or_create(&doc.id).await?;
            report.editors_scanned += 1;
            if created {
                report.knowledge_created += 1;
            }
            if knowledge.is_unenriched() {
                report.unenriched += 1;
            }
            if knowledge.completeness < threshold {
                report.pending_research.push(doc.id.clone());
            }
        }

        tracing::info!(
            scanned = report.editors_scanned,
            created = report.knowledge_created,
            pending = report.pending_research.len(),
            threshold,
            "Auto-gather complete"
        );
        Ok(report)
    }
}

/// Admin bearer token from the configured environment variable.
#[must_use]
pub fn admin_key_from_env(config: &ResearchConfig) -> Option<String> {
    std::env::var(&config.admin_key_env)
        .ok()
        .filter(|key| !key.is_empty())
}

/// Whether a request may trigger auto-gather.
///
/// Outside production every request is allowed. In production the
/// `Authorization` header must be `Bearer <admin_key>`; an unset key denies
/// everything.
#[must_use]
pub fn authorize(environment: Environment, authorization: Option<&str>, admin_key: Option<&str>) -> bool {
    if !environment.is_production() {
        return true;
    }
    let (Some(header), Some(key)) = (authorization, admin_key) else {
        return false;
    };
    header
        .strip_prefix("Bearer ")
        .is_some_and(|token| constant_time_eq(token.trim().as_bytes(), key.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

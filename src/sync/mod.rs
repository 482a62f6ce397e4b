//! Sync orchestration over external provider feeds.
//!
//! A sync request names one provider (or `all`). The name is resolved
//! before anything else happens, so an unknown source never touches the
//! store. Provider-level failures are reported in the result's `errors`
//! list; only store failures abort the run.

mod error;
mod source;

use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

pub use error::SyncError;
pub use source::{FeedSource, SyncSource};

use crate::config::SyncConfig;
use crate::directory::{ImportStats, Importer};

/// Which provider a sync run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    Tmdb,
    Imdb,
    Emmy,
    All,
}

impl SyncTarget {
    /// Accepted source names, in listing order.
    pub const ACCEPTED: [&'static str; 4] = ["tmdb", "imdb", "emmy", "all"];

    /// Parse a source name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSource` for anything but the accepted names.
    pub fn parse(value: &str) -> Result<Self, SyncError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tmdb" => Ok(Self::Tmdb),
            "imdb" => Ok(Self::Imdb),
            "emmy" => Ok(Self::Emmy),
            "all" => Ok(Self::All),
            _ => Err(SyncError::UnknownSource(value.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tmdb => "tmdb",
            Self::Imdb => "imdb",
            Self::Emmy => "emmy",
            Self::All => "all",
        }
    }
}

/// Body of a sync request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub source: String,
    #[serde(default)]
    pub max_items: Option<usize>,
}

/// Aggregated counts from one or more sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub editors_processed: usize,
    pub editors_added: usize,
    pub editors_updated: usize,
    pub credits_added: usize,
    pub awards_added: usize,
    pub errors: Vec<String>,
}

impl SyncResult {
    /// Sum another result into this one.
    pub fn merge(&mut self, other: SyncResult) {
        self.editors_processed += other.editors_processed;
        self.editors_added += other.editors_added;
        self.editors_updated += other.editors_updated;
        self.credits_added += other.credits_added;
        self.awards_added += other.awards_added;
        self.errors.extend(other.errors);
    }

    fn failed(error: &SyncError) -> Self {
        Self {
            errors: vec![error.to_string()],
            ..Self::default()
        }
    }
}

impl From<ImportStats> for SyncResult {
    fn from(stats: ImportStats) -> Self {
        Self {
            editors_processed: stats.editors_processed,
            editors_added: stats.editors_added,
            editors_updated: stats.editors_updated,
            credits_added: stats.credits_added,
            awards_added: stats.awards_added,
            errors: stats.errors,
        }
    }
}

/// Listing entry for `GET /api/sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub name: String,
    pub description: String,
    pub configured: bool,
}

/// Dispatches sync requests to registered sources.
#[derive(Clone)]
pub struct SyncOrchestrator {
    sources: Vec<Arc<dyn SyncSource>>,
    default_max_items: usize,
}

impl SyncOrchestrator {
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn SyncSource>>, default_max_items: usize) -> Self {
        Self {
            sources,
            default_max_items,
        }
    }

    /// Build the three provider feeds from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &SyncConfig, importer: &Importer) -> Result<Self, SyncError> {
        let feeds = [
            (SyncTarget::Tmdb, "The Movie Database credits feed", &config.tmdb),
            (SyncTarget::Imdb, "IMDb editor credits feed", &config.imdb),
            (SyncTarget::Emmy, "Television Academy awards feed", &config.emmy),
        ];
        let mut sources: Vec<Arc<dyn SyncSource>> = Vec::with_capacity(feeds.len());
        for (target, description, source_config) in feeds {
            let feed = FeedSource::new(target.as_str(), description, source_config, importer.clone())?;
            sources.push(Arc::new(feed));
        }
        Ok(Self::new(sources, config.default_max_items))
    }

    /// Registered sources.
    #[must_use]
    pub fn sources(&self) -> Vec<SourceInfo> {
        self.sources
            .iter()
            .map(|source| SourceInfo {
                name: source.name().to_string(),
                description: source.description().to_string(),
                configured: source.is_configured(),
            })
            .collect()
    }

    /// Run a sync for the named source.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSource` before any work if the name is not accepted,
    /// or the first `Import` error if writing to the store fails.
    pub async fn run(&self, source: &str, max_items: Option<usize>) -> Result<SyncResult, SyncError> {
        let target = SyncTarget::parse(source)?;
        let max_items = max_items.unwrap_or(self.default_max_items);

        let selected: Vec<&Arc<dyn SyncSource>> = match target {
            SyncTarget::All => self.sources.iter().collect(),
            single => self
                .sources
                .iter()
                .filter(|s| s.name() == single.as_str())
                .collect(),
        };
        if selected.is_empty() {
            return Err(SyncError::UnknownSource(source.to_string()));
        }

        tracing::info!(source = target.as_str(), max_items, sources = selected.len(), "Starting sync");
        let outcomes = join_all(selected.iter().map(|s| s.sync(max_items))).await;

        let mut result = SyncResult::default();
        for (source, outcome) in selected.iter().zip(outcomes) {
            match outcome {
                Ok(stats) => result.merge(stats.into()),
                Err(err) if err.is_upstream() => {
                    tracing::warn!(source = source.name(), error = %err, "Source sync failed");
                    result.merge(SyncResult::failed(&err));
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!(
            source = target.as_str(),
            processed = result.editors_processed,
            added = result.editors_added,
            updated = result.editors_updated,
            errors = result.errors.len(),
            "Sync complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::SourceConfig;
    use crate::store::MemoryStore;

    struct CannedSource {
        name: &'static str,
        added: usize,
    }

    #[async_trait]
    impl SyncSource for CannedSource {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "canned"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn sync(&self, max_items: usize) -> Result<ImportStats, SyncError> {
            let added = self.added.min(max_items);
            Ok(ImportStats {
                editors_processed: added,
                editors_added: added,
                ..ImportStats::default()
            })
        }
    }

    fn orchestrator() -> SyncOrchestrator {
        SyncOrchestrator::new(
            vec![
                Arc::new(CannedSource { name: "tmdb", added: 3 }),
                Arc::new(CannedSource { name: "imdb", added: 2 }),
                Arc::new(CannedSource { name: "emmy", added: 1 }),
            ],
            50,
        )
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(SyncTarget::parse("tmdb").unwrap(), SyncTarget::Tmdb);
        assert_eq!(SyncTarget::parse(" ALL ").unwrap(), SyncTarget::All);
        assert!(matches!(
            SyncTarget::parse("bogus"),
            Err(SyncError::UnknownSource(name)) if name == "bogus"
        ));
    }

    #[tokio::test]
    async fn test_single_source() {
        let result = orchestrator().run("imdb", None).await.unwrap();
        assert_eq!(result.editors_added, 2);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_all_sums_sources() {
        let result = orchestrator().run("all", Some(2)).await.unwrap();
        assert_eq!(result.editors_processed, 5);
        assert_eq!(result.editors_added, 5);
    }

    #[tokio::test]
    async fn test_unknown_source_rejected() {
        let err = orchestrator().run("netflix", None).await.unwrap_err();
        assert!(matches!(err, SyncError::UnknownSource(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_feed_reports_error() {
        let importer = Importer::new(Arc::new(MemoryStore::new()));
        let config = SyncConfig {
            tmdb: SourceConfig::default(),
            ..SyncConfig::default()
        };
        let orchestrator = SyncOrchestrator::from_config(&config, &importer).unwrap();

        let result = orchestrator.run("all", None).await.unwrap();
        assert_eq!(result.editors_processed, 0);
        assert_eq!(result.errors.len(), 3);
        assert!(result.errors.iter().all(|e| e.contains("not configured")));
    }

    #[test]
    fn test_sources_listing() {
        let importer = Importer::new(Arc::new(MemoryStore::new()));
        let config = SyncConfig {
            emmy: SourceConfig::new("https://emmy.example.com", None),
            ..SyncConfig::default()
        };
        let listing = SyncOrchestrator::from_config(&config, &importer)
            .unwrap()
            .sources();

        let names: Vec<_> = listing.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["tmdb", "imdb", "emmy"]);
        assert!(!listing[0].configured);
        assert!(listing[2].configured);
    }
}

//! Provider feeds that supply editor bundles.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::error::SyncError;
use crate::config::SourceConfig;
use crate::directory::{DirectoryError, ImportStats, Importer};

/// Connection timeout for feed requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for feed requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of retries for transient failures.
const MAX_RETRIES: u32 = 3;

/// A provider the orchestrator can pull editors from.
#[async_trait]
pub trait SyncSource: Send + Sync {
    /// Identifier used on the command line and in requests.
    fn name(&self) -> &str;

    /// One-line description for source listings.
    fn description(&self) -> &str;

    /// Whether the source has what it needs to run.
    fn is_configured(&self) -> bool;

    /// Fetch up to `max_items` editors and import them.
    async fn sync(&self, max_items: usize) -> Result<ImportStats, SyncError>;
}

/// Determine if a request should be retried based on status code and attempt count.
fn should_retry(status_code: u16, attempt: u32) -> bool {
    if attempt >= MAX_RETRIES {
        return false;
    }
    (500..600).contains(&status_code)
}

/// Exponential backoff: base, 2x base, 4x base.
fn calculate_backoff(base: Duration, attempt: u32) -> Duration {
    base * (1 << attempt)
}

/// JSON feed serving `GET {base_url}/editors?limit=N`.
#[derive(Clone)]
pub struct FeedSource {
    name: String,
    description: String,
    client: Client,
    base_url: Option<String>,
    api_key_env: Option<String>,
    backoff_base: Duration,
    importer: Importer,
}

impl FeedSource {
    /// Create a feed source from its configuration.
    ///
    /// # Errors
    ///
    /// Returns `Upstream` if the HTTP client cannot be built.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        config: &SourceConfig,
        importer: Importer,
    ) -> Result<Self, SyncError> {
        let name = name.into();
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::upstream(&name, format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            name,
            description: description.into(),
            client,
            base_url: config.base_url.clone().filter(|url| !url.trim().is_empty()),
            api_key_env: config.api_key_env.clone(),
            backoff_base: Duration::from_secs(1),
            importer,
        })
    }

    /// Set the first retry delay (builder pattern).
    #[must_use]
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// URL of the editors listing for `max_items`.
    ///
    /// # Errors
    ///
    /// Returns `Upstream` if no base URL is configured or it is malformed.
    pub fn editors_url(&self, max_items: usize) -> Result<Url, SyncError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| SyncError::upstream(&self.name, "not configured"))?;
        let mut url = Url::parse(base)
            .map_err(|e| SyncError::upstream(&self.name, format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| SyncError::upstream(&self.name, "base URL cannot hold a path"))?
            .pop_if_empty()
            .push("editors");
        url.query_pairs_mut()
            .append_pair("limit", &max_items.to_string());
        Ok(url)
    }

    fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty())
    }

    async fn fetch(&self, url: Url) -> Result<Value, SyncError> {
        let api_key = self.api_key();
        let mut attempt = 0;
        loop {
            let mut request = self.client.get(url.clone());
            if let Some(key) = &api_key {
                request = request.bearer_auth(key);
            }

            let response = request.send().await.map_err(|e| {
                if e.is_timeout() {
                    SyncError::upstream(&self.name, "request timed out")
                } else {
                    SyncError::upstream(&self.name, e.to_string())
                }
            })?;

            let status = response.status();
            if status.is_success() {
                return response
                    .json()
                    .await
                    .map_err(|e| SyncError::upstream(&self.name, format!("invalid JSON: {e}")));
            }

            let status_code = status.as_u16();
            if should_retry(status_code, attempt) {
                let backoff = calculate_backoff(self.backoff_base, attempt);
                tracing::warn!(
                    source = %self.name,
                    status = status_code,
                    attempt = attempt + 1,
                    backoff_ms = backoff.as_millis(),
                    "Feed request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            return Err(SyncError::upstream(&self.name, format!("HTTP {status}: {text}")));
        }
    }
}

#[async_trait]
impl SyncSource for FeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    async fn sync(&self, max_items: usize) -> Result<ImportStats, SyncError> {
        let url = self.editors_url(max_items)?;
        tracing::info!(source = %self.name, url = %url, "Fetching editors feed");

        let payload = self.fetch(url).await?;
        match self.importer.import_value(payload).await {
            Ok(stats) => Ok(stats),
            Err(DirectoryError::Invalid(message)) => Err(SyncError::upstream(
                &self.name,
                format!("unexpected payload: {message}"),
            )),
            Err(source) => Err(SyncError::Import {
                source_name: self.name.clone(),
                source,
            }),
        }
    }
}

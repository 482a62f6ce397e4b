//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default port for the API server.
pub const DEFAULT_PORT: u16 = 3000;

/// Default number of operations per cleanup batch commit.
pub const DEFAULT_CLEANUP_BATCH_SIZE: usize = 400;

/// Deployment environment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Whether admin-only routes must be guarded.
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Parse an `APP_ENV`-style value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

/// Document store backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Sqlite,
}

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to use.
    pub backend: StoreBackend,
    /// Database file for the sqlite backend.
    pub path: PathBuf,
}

/// Returns the default path for the directory database.
///
/// This is `~/.local/share/editor-directory/directory.db` on Unix systems.
#[must_use]
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("editor-directory")
        .join("directory.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable permissive CORS.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            cors_permissive: true,
        }
    }
}

/// Connection settings for one external sync provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the provider feed; the source is disabled when unset.
    pub base_url: Option<String>,
    /// Environment variable holding the provider API key.
    pub api_key_env: Option<String>,
}

impl SourceConfig {
    /// Source pointing at a feed URL with an API key env var.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key_env: Option<&str>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            api_key_env: api_key_env.map(String::from),
        }
    }
}

/// Sync orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Media metadata provider.
    pub tmdb: SourceConfig,
    /// Film and television credits provider.
    pub imdb: SourceConfig,
    /// Awards database.
    pub emmy: SourceConfig,
    /// Items fetched per source when the request does not say.
    pub default_max_items: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tmdb: SourceConfig {
                base_url: None,
                api_key_env: Some("TMDB_API_KEY".to_string()),
            },
            imdb: SourceConfig::default(),
            emmy: SourceConfig::default(),
            default_max_items: 50,
        }
    }
}

/// Cleanup heuristic configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CleanupConfig {
    /// Operations per batch commit (clamped to the store ceiling).
    pub batch_size: usize,
    /// Names that only ever appear in seeded mock data.
    pub mock_names: Vec<String>,
    /// ID prefixes used by synthetic records.
    pub synthetic_id_prefixes: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_CLEANUP_BATCH_SIZE,
            mock_names: [
                "John Smith",
                "Jane Doe",
                "Sarah Johnson",
                "Michael Chen",
                "Emily Rodriguez",
                "David Kim",
                "Test Editor",
                "Sample Editor",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            synthetic_id_prefixes: ["web-", "mock-", "test-", "sample-", "fake-"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Auto-research configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResearchConfig {
    /// Environment variable holding the admin bearer token.
    pub admin_key_env: String,
    /// Completeness below which an editor is queued for research.
    pub min_completeness: f64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            admin_key_env: "ADMIN_API_KEY".to_string(),
            min_completeness: 0.5,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub sync: SyncConfig,
    pub cleanup: CleanupConfig,
    pub research: ResearchConfig,
}

//! Configuration file loader.

use std::path::{Path, PathBuf};

use super::types::{AppConfig, Environment, StoreBackend};

/// Environment variable selecting the deployment environment.
pub const APP_ENV_VAR: &str = "APP_ENV";

/// Environment variable overriding the sqlite database path.
pub const DB_PATH_VAR: &str = "EDITOR_DIRECTORY_DB";

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: .editor-directory.toml
        search_paths.push(PathBuf::from(".editor-directory.toml"));

        // 2. User config directory: ~/.config/editor-directory/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("editor-directory").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// Environment overrides (`APP_ENV`, `EDITOR_DIRECTORY_DB`) are applied
    /// on top of whatever was loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let config = match self.find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::load_from_path(&path)?
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                AppConfig::default()
            }
        };

        apply_overrides(
            config,
            std::env::var(APP_ENV_VAR).ok().as_deref(),
            std::env::var(DB_PATH_VAR).ok().as_deref(),
        )
    }

    /// Load configuration from a specific path.
    fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the first config file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|p| p.exists()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply environment overrides to a loaded configuration.
///
/// # Errors
///
/// Returns a validation error if `app_env` names an unknown environment.
pub fn apply_overrides(
    mut config: AppConfig,
    app_env: Option<&str>,
    db_path: Option<&str>,
) -> Result<AppConfig, ConfigError> {
    if let Some(value) = app_env {
        config.environment = Environment::parse(value).ok_or_else(|| {
            ConfigError::Validation(format!(
                "{APP_ENV_VAR} must be 'development' or 'production', got '{value}'"
            ))
        })?;
    }
    if let Some(path) = db_path.filter(|p| !p.trim().is_empty()) {
        config.store.backend = StoreBackend::Sqlite;
        config.store.path = PathBuf::from(path);
    }
    Ok(config)
}

impl AppConfig {
    /// Path of the persistent store that administrative commands write to.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the store is not persistent, since a
    /// one-shot command against an in-memory store would discard its work.
    pub fn require_persistent_store(&self) -> Result<&Path, ConfigError> {
        match self.store.backend {
            StoreBackend::Sqlite => Ok(&self.store.path),
            StoreBackend::Memory => Err(ConfigError::Validation(format!(
                "administrative commands need a persistent store; set store.backend = \"sqlite\" or {DB_PATH_VAR}"
            ))),
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

//! Shared state handed to every request handler.

use std::sync::Arc;

use crate::config::{AppConfig, Environment};
use crate::directory::{DirectoryRepository, Importer};
use crate::knowledge::KnowledgeService;
use crate::research::{admin_key_from_env, AutoResearch};
use crate::store::SharedStore;
use crate::sync::{SyncError, SyncOrchestrator};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub knowledge: KnowledgeService,
    pub directory: DirectoryRepository,
    pub sync: SyncOrchestrator,
    pub research: AutoResearch,
    pub environment: Environment,
    /// Bearer token guarding auto-gather in production.
    pub admin_key: Option<Arc<str>>,
}

impl AppState {
    /// Wire every service over one store handle.
    ///
    /// The admin key is read once from the environment variable named in
    /// the research configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a sync source cannot be constructed.
    pub fn new(store: SharedStore, config: &AppConfig) -> Result<Self, SyncError> {
        let importer = Importer::new(store.clone());
        Ok(Self {
            knowledge: KnowledgeService::new(store.clone()),
            directory: DirectoryRepository::new(store.clone()),
            sync: SyncOrchestrator::from_config(&config.sync, &importer)?,
            research: AutoResearch::new(store.clone(), &config.research),
            environment: config.environment,
            admin_key: admin_key_from_env(&config.research).map(Arc::from),
            store,
        })
    }

    /// Replace the sync orchestrator (builder pattern).
    #[must_use]
    pub fn with_sync(mut self, sync: SyncOrchestrator) -> Self {
        self.sync = sync;
        self
    }

    /// Replace the admin key (builder pattern).
    #[must_use]
    pub fn with_admin_key(mut self, admin_key: Option<&str>) -> Self {
        self.admin_key = admin_key.map(Arc::from);
        self
    }

    /// Set the environment (builder pattern).
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }
}

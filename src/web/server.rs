//! HTTP server with axum router and graceful shutdown.

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::ServerError;
use super::handlers::{
    add_award, add_credit, create_editor, get_editor, get_health, get_knowledge,
    get_sync_sources, list_editors, patch_editor, post_auto_gather, post_knowledge, post_sync,
};
use super::state::AppState;
use crate::config::ServerConfig;

/// Build the API router with all routes and middleware.
pub fn build_router(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/api/health", get(get_health))
        .route(
            "/api/knowledge/:editor_id",
            get(get_knowledge).post(post_knowledge),
        )
        .route("/api/sync", get(get_sync_sources).post(post_sync))
        .route("/api/research/auto-gather", post(post_auto_gather))
        .route("/api/editors", get(list_editors).post(create_editor))
        .route(
            "/api/editors/:editor_id",
            get(get_editor).patch(patch_editor),
        )
        .route("/api/editors/:editor_id/credits", post(add_credit))
        .route("/api/editors/:editor_id/awards", post(add_award))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Directory API server.
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
    cancel: CancellationToken,
}

impl ApiServer {
    /// Create a server with default configuration.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            config: ServerConfig::default(),
            state,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the server configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Token that stops the server when cancelled.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get the configured address as a string.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the axum router for this server's state and configuration.
    pub fn build_router(&self) -> Router {
        build_router(self.state.clone(), self.config.cors_permissive)
    }

    /// Run the server until the cancellation token fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or serve.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.address();
        let app = self.build_router();
        let cancel = self.cancel;

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::BindError {
                address: addr.clone(),
                source,
            })?;

        tracing::info!(
            address = %addr,
            backend = self.state.store.backend_name(),
            environment = self.state.environment.as_str(),
            "Starting API server"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("API server shutting down gracefully");
            })
            .await?;
        Ok(())
    }
}

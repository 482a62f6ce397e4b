//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::api::ErrorResponse;
use crate::directory::DirectoryError;
use crate::knowledge::KnowledgeError;
use crate::research::ResearchError;
use crate::store::StoreError;
use crate::sync::SyncError;

/// Errors returned by request handlers.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Caller sent something unusable.
    #[error("{0}")]
    BadRequest(String),

    /// Knowledge POST named an unknown action.
    #[error("{0}")]
    InvalidAction(String),

    #[error("Missing or invalid bearer token")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Provider feed failure.
    #[error("{0}")]
    Upstream(String),

    /// Store or other internal failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::InvalidAction(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label placed in the envelope's `error` field.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "Invalid request",
            Self::InvalidAction(_) => "Invalid action",
            Self::Unauthorized => "Unauthorized",
            Self::NotFound(_) => "Not found",
            Self::Conflict(_) => "Conflict",
            Self::Upstream(_) => "Upstream service error",
            Self::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(ErrorResponse::new(self.label(), self.to_string()))).into_response()
    }
}

impl From<KnowledgeError> for ApiError {
    fn from(err: KnowledgeError) -> Self {
        match err {
            KnowledgeError::InvalidAction(_) => Self::InvalidAction(err.to_string()),
            KnowledgeError::NotFound(_) => Self::NotFound(err.to_string()),
            _ if err.is_client_error() => Self::BadRequest(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound { .. } => Self::NotFound(err.to_string()),
            DirectoryError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            DirectoryError::Invalid(_) => Self::BadRequest(err.to_string()),
            DirectoryError::Store(store) => store.into(),
            DirectoryError::ReadFile { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::UnknownSource(_) => Self::BadRequest(err.to_string()),
            SyncError::Upstream { .. } => Self::Upstream(err.to_string()),
            SyncError::Import { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<ResearchError> for ApiError {
    fn from(err: ResearchError) -> Self {
        match err {
            ResearchError::InvalidThreshold(_) => Self::BadRequest(err.to_string()),
            ResearchError::Knowledge(inner) => inner.into(),
            ResearchError::Store(_) => Self::Internal(err.to_string()),
        }
    }
}

/// Errors from running the HTTP server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Server stopped with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

//! JSON envelope types for the HTTP API.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Envelope wrapping every successful response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub success: bool,
    /// Optional human-readable note about the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    /// Create a success response.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data,
            success: true,
            message: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a message (builder pattern).
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Payload of an error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorData {
    pub message: String,
}

/// Envelope wrapping every failed response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub data: ErrorData,
    pub success: bool,
    /// Short error label, e.g. `Invalid action`.
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    /// Create an error response.
    #[must_use]
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            data: ErrorData {
                message: message.into(),
            },
            success: false,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Response body for GET /api/health.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub store_backend: &'static str,
    pub environment: &'static str,
}

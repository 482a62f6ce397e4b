//! HTTP API for the editor directory.

mod api;
mod error;
mod handlers;
mod server;
mod state;

pub use api::{ApiResponse, ErrorData, ErrorResponse, HealthResponse};
pub use error::{ApiError, ServerError};
pub use server::{build_router, ApiServer};
pub use state::AppState;

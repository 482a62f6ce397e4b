//! HTTP handlers for the directory API.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde_json::Value;

use super::api::{ApiResponse, HealthResponse};
use super::error::ApiError;
use super::state::AppState;
use crate::directory::{
    Award, Credit, Editor, EditorFilter, EditorProfile, NewAward, NewCredit, NewEditor,
};
use crate::knowledge::{ActionOutcome, EditorKnowledge};
use crate::research::{authorize, AutoGatherReport, AutoGatherRequest};
use crate::store::Fields;
use crate::sync::{SourceInfo, SyncRequest, SyncResult};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

fn object_body(body: Result<Json<Value>, JsonRejection>) -> Result<Fields, ApiError> {
    match json_body(body)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(ApiError::BadRequest("Request body must be a JSON object".to_string())),
    }
}

/// GET /api/health - Liveness probe.
pub async fn get_health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        store_backend: state.store.backend_name(),
        environment: state.environment.as_str(),
    }))
}

/// GET /api/knowledge/:editor_id - Read, creating defaults on first access.
pub async fn get_knowledge(
    State(state): State<AppState>,
    Path(editor_id): Path<String>,
) -> ApiResult<EditorKnowledge> {
    let (knowledge, created) = state.knowledge.get_or_create(&editor_id).await?;
    let response = ApiResponse::success(knowledge);
    Ok(Json(if created {
        response.with_message("Knowledge record created")
    } else {
        response
    }))
}

/// POST /api/knowledge/:editor_id - Apply `update` or `regenerate`.
///
/// `data` is the updated record, or `null` when the action did not change
/// anything.
pub async fn post_knowledge(
    State(state): State<AppState>,
    Path(editor_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Option<EditorKnowledge>> {
    let patch = object_body(body)?;
    let action = match patch.get("action") {
        None | Some(Value::Null) => "update".to_string(),
        Some(Value::String(action)) => action.clone(),
        Some(other) => other.to_string(),
    };

    let outcome = state
        .knowledge
        .apply_action(&editor_id, &action, patch)
        .await?;
    let response = match outcome {
        ActionOutcome::Updated(knowledge) => {
            ApiResponse::success(Some(*knowledge)).with_message("Knowledge updated successfully")
        }
        ActionOutcome::NotImplemented { message } => {
            ApiResponse::success(None).with_message(message)
        }
    };
    Ok(Json(response))
}

/// GET /api/sync - List available sources.
pub async fn get_sync_sources(State(state): State<AppState>) -> Json<ApiResponse<Vec<SourceInfo>>> {
    Json(ApiResponse::success(state.sync.sources()))
}

/// POST /api/sync - Run a sync for one source or `all`.
pub async fn post_sync(
    State(state): State<AppState>,
    body: Result<Json<SyncRequest>, JsonRejection>,
) -> ApiResult<SyncResult> {
    let request = json_body(body)?;
    let result = state.sync.run(&request.source, request.max_items).await?;
    let message = format!("Sync completed for {}", request.source.trim());
    Ok(Json(ApiResponse::success(result).with_message(message)))
}

/// POST /api/research/auto-gather - Guarantee knowledge records for editors.
pub async fn post_auto_gather(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<AutoGatherReport> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if !authorize(state.environment, authorization, state.admin_key.as_deref()) {
        tracing::warn!("Rejected auto-gather request without valid admin token");
        return Err(ApiError::Unauthorized);
    }

    let request: AutoGatherRequest = if body.iter().all(u8::is_ascii_whitespace) {
        AutoGatherRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };

    let report = state.research.run(&request).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// GET /api/editors - List editors, filtered and sorted by name.
pub async fn list_editors(
    State(state): State<AppState>,
    query: Result<Query<EditorFilter>, QueryRejection>,
) -> ApiResult<Vec<Editor>> {
    let Query(filter) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let editors = state.directory.list_editors(&filter).await?;
    Ok(Json(ApiResponse::success(editors)))
}

/// POST /api/editors - Create an editor.
pub async fn create_editor(
    State(state): State<AppState>,
    body: Result<Json<NewEditor>, JsonRejection>,
) -> Created<Editor> {
    let editor = state.directory.create_editor(json_body(body)?).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(editor))))
}

/// GET /api/editors/:editor_id - Editor profile with credits and awards.
pub async fn get_editor(
    State(state): State<AppState>,
    Path(editor_id): Path<String>,
) -> ApiResult<EditorProfile> {
    let profile = state.directory.get_profile(&editor_id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PATCH /api/editors/:editor_id - Partial update.
pub async fn patch_editor(
    State(state): State<AppState>,
    Path(editor_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Editor> {
    let patch = object_body(body)?;
    let editor = state.directory.update_editor(&editor_id, patch).await?;
    Ok(Json(ApiResponse::success(editor)))
}

/// POST /api/editors/:editor_id/credits - Add a credit.
pub async fn add_credit(
    State(state): State<AppState>,
    Path(editor_id): Path<String>,
    body: Result<Json<NewCredit>, JsonRejection>,
) -> Created<Credit> {
    let credit = state.directory.add_credit(&editor_id, json_body(body)?).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(credit))))
}

/// POST /api/editors/:editor_id/awards - Add an award.
pub async fn add_award(
    State(state): State<AppState>,
    Path(editor_id): Path<String>,
    body: Result<Json<NewAward>, JsonRejection>,
) -> Created<Award> {
    let award = state.directory.add_award(&editor_id, json_body(body)?).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(award))))
}

//! Integration tests for the auto-gather route and health check.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::json;

use common::{router, send, send_with_headers};
use editor_directory::config::{AppConfig, Environment};
use editor_directory::directory::{DirectoryRepository, Location, NewEditor};
use editor_directory::store::{MemoryStore, EDITOR_KNOWLEDGE};
use editor_directory::web::AppState;

const ADMIN_KEY: &str = "admin-s3cret";

async fn seeded_app(environment: Environment, admin_key: Option<&str>) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let repo = DirectoryRepository::new(store.clone());
    for (id, name) in [("ed-1", "Ana Ruiz"), ("ed-2", "Ben Okafor"), ("ed-3", "Lee Park")] {
        repo.create_editor(NewEditor::new(name, Location::new("Atlanta", "GA")).with_id(id))
            .await
            .expect("seed editor");
    }
    let state = AppState::new(store.clone(), &AppConfig::default())
        .expect("app state")
        .with_environment(environment)
        .with_admin_key(admin_key);
    (router(state), store)
}

#[tokio::test]
async fn test_production_requires_bearer_token() {
    let (app, store) = seeded_app(Environment::Production, Some(ADMIN_KEY)).await;

    let (status, body) = send(&app, Method::POST, "/api/research/auto-gather", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send_with_headers(
        &app,
        Method::POST,
        "/api/research/auto-gather",
        None,
        &[("authorization", "Bearer wrong-key")],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_with_headers(
        &app,
        Method::POST,
        "/api/research/auto-gather",
        None,
        &[("authorization", ADMIN_KEY)],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(store.count(EDITOR_KNOWLEDGE).await, 0);

    let bearer = format!("Bearer {ADMIN_KEY}");
    let (status, body) = send_with_headers(
        &app,
        Method::POST,
        "/api/research/auto-gather",
        Some(json!({"maxEditors": 2})),
        &[("authorization", bearer.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["editorsScanned"], 2);
    assert_eq!(body["data"]["knowledgeCreated"], 2);
    assert_eq!(store.count(EDITOR_KNOWLEDGE).await, 2);
}

#[tokio::test]
async fn test_production_without_key_denies_everything() {
    let (app, _store) = seeded_app(Environment::Production, None).await;

    let (status, _) = send_with_headers(
        &app,
        Method::POST,
        "/api/research/auto-gather",
        None,
        &[("authorization", "Bearer ")],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_development_runs_without_auth() {
    let (app, store) = seeded_app(Environment::Development, None).await;

    let (status, body) = send(&app, Method::POST, "/api/research/auto-gather", None).await;
    assert_eq!(status, StatusCode::OK);
    let report = &body["data"];
    assert_eq!(report["editorsScanned"], 3);
    assert_eq!(report["knowledgeCreated"], 3);
    assert_eq!(report["unenriched"], 3);
    assert_eq!(report["pendingResearch"].as_array().expect("pending").len(), 3);
    assert_eq!(store.count(EDITOR_KNOWLEDGE).await, 3);

    let (_, again) = send(&app, Method::POST, "/api/research/auto-gather", Some(json!({}))).await;
    assert_eq!(again["data"]["knowledgeCreated"], 0);
    assert_eq!(again["data"]["editorsScanned"], 3);
}

#[tokio::test]
async fn test_threshold_out_of_range_is_rejected() {
    let (app, store) = seeded_app(Environment::Development, None).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/research/auto-gather",
        Some(json!({"minCompleteness": 2.5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request");
    assert_eq!(store.count(EDITOR_KNOWLEDGE).await, 0);
}

#[tokio::test]
async fn test_health_reports_backend_and_environment() {
    let (app, _store) = seeded_app(Environment::Production, None).await;

    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["storeBackend"], "memory");
    assert_eq!(body["data"]["environment"], "production");
}

//! Integration tests for sync routes and feed sources against a local upstream.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use common::{counting_store, router, send, test_app};
use editor_directory::config::{AppConfig, SourceConfig};
use editor_directory::directory::Importer;
use editor_directory::store::{MemoryStore, SharedStore, CREDITS, EDITORS};
use editor_directory::sync::{FeedSource, SyncOrchestrator, SyncSource};
use editor_directory::web::AppState;

const KEY_VAR: &str = "EDITOR_DIRECTORY_TEST_FEED_KEY";

#[derive(Clone)]
struct Upstream {
    hits: Arc<AtomicUsize>,
    failures_before_success: usize,
    expected_key: Option<&'static str>,
}

async fn editors_feed(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let hit = upstream.hits.fetch_add(1, Ordering::SeqCst);
    if hit < upstream.failures_before_success {
        return (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response();
    }
    if let Some(key) = upstream.expected_key {
        let expected = format!("Bearer {key}");
        let sent = headers.get("authorization").and_then(|v| v.to_str().ok());
        if sent != Some(expected.as_str()) {
            return (StatusCode::UNAUTHORIZED, "bad key").into_response();
        }
    }

    let limit: usize = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(usize::MAX);
    let editors: Vec<Value> = (0..3)
        .map(|i| {
            json!({
                "id": format!("feed-ed-{i}"),
                "name": format!("Feed Editor {i}"),
                "location": {"city": "Atlanta", "state": "GA"},
                "source": "tmdb",
                "credits": [{"showTitle": format!("Show {i}"), "year": 2023}]
            })
        })
        .take(limit)
        .collect();
    Json(editors).into_response()
}

async fn spawn_upstream(upstream: Upstream) -> String {
    let app = Router::new()
        .route("/v1/editors", get(editors_feed))
        .with_state(upstream);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("upstream server");
    });
    format!("http://{addr}/v1")
}

fn feed(base_url: &str, api_key_env: Option<&str>, store: SharedStore) -> FeedSource {
    FeedSource::new(
        "tmdb",
        "Local test feed",
        &SourceConfig::new(base_url, api_key_env),
        Importer::new(store),
    )
    .expect("feed source")
    .with_backoff_base(Duration::from_millis(10))
}

#[tokio::test]
async fn test_bogus_source_rejected_before_store_access() {
    let (shared, counting) = counting_store();
    let state = AppState::new(shared, &AppConfig::default()).expect("app state");
    let app = router(state);

    let (status, body) = send(&app, Method::POST, "/api/sync", Some(json!({"source": "bogus"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["data"]["message"]
        .as_str()
        .expect("message")
        .contains("bogus"));
    assert_eq!(counting.reads(), 0);
    assert_eq!(counting.commits(), 0);
}

#[tokio::test]
async fn test_list_sources() {
    let (app, _store) = test_app();

    let (status, body) = send(&app, Method::GET, "/api/sync", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["data"]
        .as_array()
        .expect("sources")
        .iter()
        .map(|s| s["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["tmdb", "imdb", "emmy"]);
}

#[tokio::test]
async fn test_unconfigured_sources_report_errors() {
    let (app, store) = test_app();

    let (status, body) = send(&app, Method::POST, "/api/sync", Some(json!({"source": "all"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["editorsProcessed"], 0);
    assert_eq!(body["data"]["errors"].as_array().expect("errors").len(), 3);
    assert_eq!(store.count(EDITORS).await, 0);
}

#[tokio::test]
async fn test_feed_sync_through_route() {
    std::env::set_var(KEY_VAR, "feed-secret");
    let base_url = spawn_upstream(Upstream {
        hits: Arc::new(AtomicUsize::new(0)),
        failures_before_success: 0,
        expected_key: Some("feed-secret"),
    })
    .await;

    let store = Arc::new(MemoryStore::new());
    let source: Arc<dyn SyncSource> = Arc::new(feed(&base_url, Some(KEY_VAR), store.clone()));
    let state = AppState::new(store.clone(), &AppConfig::default())
        .expect("app state")
        .with_sync(SyncOrchestrator::new(vec![source], 50));
    let app = router(state);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sync",
        Some(json!({"source": "tmdb", "maxItems": 2})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["editorsAdded"], 2);
    assert_eq!(body["data"]["creditsAdded"], 2);
    assert_eq!(body["message"], "Sync completed for tmdb");
    assert_eq!(store.count(EDITORS).await, 2);
    assert_eq!(store.count(CREDITS).await, 2);

    let (_, again) = send(
        &app,
        Method::POST,
        "/api/sync",
        Some(json!({"source": "tmdb", "maxItems": 2})),
    )
    .await;
    assert_eq!(again["data"]["editorsUpdated"], 2);
    assert_eq!(again["data"]["creditsAdded"], 0);
}

#[tokio::test]
async fn test_feed_retries_server_errors() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = spawn_upstream(Upstream {
        hits: hits.clone(),
        failures_before_success: 2,
        expected_key: None,
    })
    .await;

    let store = Arc::new(MemoryStore::new());
    let stats = feed(&base_url, None, store.clone())
        .sync(10)
        .await
        .expect("sync after retries");

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(stats.editors_added, 3);
    assert_eq!(store.count(EDITORS).await, 3);
}

#[tokio::test]
async fn test_feed_gives_up_after_max_retries() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = spawn_upstream(Upstream {
        hits: hits.clone(),
        failures_before_success: usize::MAX,
        expected_key: None,
    })
    .await;

    let store = Arc::new(MemoryStore::new());
    let err = feed(&base_url, None, store.clone())
        .sync(10)
        .await
        .unwrap_err();

    assert!(err.is_upstream());
    assert!(err.to_string().contains("503"));
    assert_eq!(hits.load(Ordering::SeqCst), 4);
    assert_eq!(store.count(EDITORS).await, 0);
}

#[tokio::test]
async fn test_feed_client_error_is_not_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = spawn_upstream(Upstream {
        hits: hits.clone(),
        failures_before_success: 0,
        expected_key: Some("never-sent"),
    })
    .await;

    let err = feed(&base_url, None, Arc::new(MemoryStore::new()))
        .sync(10)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("401"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

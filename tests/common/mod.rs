//! Shared helpers for router-level integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::util::ServiceExt;

use editor_directory::config::AppConfig;
use editor_directory::store::{
    DocPath, Document, DocumentStore, MemoryStore, SharedStore, StoreResult, WriteBatch,
};
use editor_directory::web::{build_router, AppState};

/// Router over a fresh in-memory store with default configuration.
pub fn test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), &AppConfig::default()).expect("app state");
    (build_router(state, false), store)
}

/// Router over the given state.
pub fn router(state: AppState) -> Router {
    build_router(state, false)
}

/// Send a request and decode the JSON response.
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_headers(router, method, uri, body, &[]).await
}

/// Send a request with extra headers and decode the JSON response.
pub async fn send_with_headers(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

/// Store wrapper that counts every call before delegating.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub reads: AtomicUsize,
    pub commits: AtomicUsize,
}

impl CountingStore {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    fn backend_name(&self) -> &'static str {
        "counting"
    }

    async fn get(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(path).await
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.list(collection).await
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit(batch).await
    }
}

/// Shared handle to a counting store plus the concrete handle.
pub fn counting_store() -> (SharedStore, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::default());
    (store.clone(), store)
}

//! Integration tests for the persistent document store.

use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

use editor_directory::knowledge::KnowledgeService;
use editor_directory::store::{
    DocPath, DocumentStore, DocumentUpdate, Fields, SqliteStore, StoreError, WriteBatch,
    EDITORS, EDITOR_KNOWLEDGE, MAX_BATCH_OPS,
};

fn fields(value: Value) -> Fields {
    value.as_object().cloned().expect("object")
}

#[tokio::test]
async fn test_documents_survive_reopen() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let db_path = temp_dir.path().join("nested").join("directory.db");

    {
        let store = assert_ok!(SqliteStore::open(&db_path).await);
        assert_eq!(store.path(), Some(db_path.as_path()));
        assert_ok!(
            store
                .set(
                    &DocPath::new(EDITORS, "ed-1"),
                    fields(json!({"name": "Ana Ruiz", "location": {"city": "Atlanta", "state": "GA"}})),
                )
                .await
        );
        let knowledge = KnowledgeService::new(std::sync::Arc::new(store.clone()));
        assert_ok!(knowledge.get_or_create("ed-1").await);
    }

    let store = assert_ok!(SqliteStore::open(&db_path).await);
    let editor = assert_ok!(store.get(&DocPath::new(EDITORS, "ed-1")).await).expect("editor");
    assert_eq!(editor.str_field("location.city"), Some("Atlanta"));
    let knowledge = assert_ok!(store.list(EDITOR_KNOWLEDGE).await);
    assert_eq!(knowledge.len(), 1);
    assert_eq!(knowledge[0].id, "ed-1");
}

#[tokio::test]
async fn test_oversized_batch_is_rejected_whole() {
    let store = assert_ok!(SqliteStore::open_in_memory().await);
    let mut batch = WriteBatch::new();
    for i in 0..=MAX_BATCH_OPS {
        batch = batch.set(DocPath::new(EDITORS, format!("ed-{i}")), fields(json!({"n": i})));
    }
    assert_eq!(batch.len(), MAX_BATCH_OPS + 1);

    let err = assert_err!(store.commit(batch).await);
    assert!(matches!(
        err,
        StoreError::BatchTooLarge { size, limit } if size == MAX_BATCH_OPS + 1 && limit == MAX_BATCH_OPS
    ));
    assert!(assert_ok!(store.list(EDITORS).await).is_empty());
}

#[tokio::test]
async fn test_failed_batch_rolls_back() {
    let store = assert_ok!(SqliteStore::open_in_memory().await);
    let existing = DocPath::new(EDITORS, "ed-1");
    assert_ok!(store.set(&existing, fields(json!({"name": "Ana Ruiz"}))).await);

    let batch = WriteBatch::new()
        .set(DocPath::new(EDITORS, "ed-2"), fields(json!({"name": "Ben Okafor"})))
        .update(
            existing.clone(),
            DocumentUpdate::new(fields(json!({"name": "Renamed"}))),
        )
        .create(existing.clone(), fields(json!({"name": "Duplicate"})));
    let err = assert_err!(store.commit(batch).await);
    assert!(matches!(err, StoreError::AlreadyExists { .. }));

    let docs = assert_ok!(store.list(EDITORS).await);
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].str_field("name"), Some("Ana Ruiz"));
}

#[tokio::test]
async fn test_update_missing_document_fails() {
    let store = assert_ok!(SqliteStore::open_in_memory().await);
    let err = assert_err!(
        store
            .update(
                &DocPath::new(EDITORS, "ghost"),
                DocumentUpdate::new(fields(json!({"bio": "nobody"}))),
            )
            .await
    );
    assert!(matches!(err, StoreError::NotFound { .. }));
}

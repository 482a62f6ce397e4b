//! `SQLite`-backed document store with async operations via `spawn_blocking`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tokio::sync::Mutex;

use super::document::{timestamp_value, DocPath, Document, Fields, WriteBatch, WriteOp};
use super::error::{StoreError, StoreResult};
use super::DocumentStore;

/// Schema for the document table.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    written_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
";

/// Document store persisted in a single `SQLite` file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open a store at the specified path.
    ///
    /// Creates parent directories if they don't exist and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot be applied.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StoreError::Backend(format!(
                        "failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let path_clone = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> StoreResult<Connection> {
            let conn = Connection::open(&path_clone)?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        tracing::debug!(path = %path.display(), "Opened sqlite document store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let conn = tokio::task::spawn_blocking(|| -> StoreResult<Connection> {
            let conn = Connection::open_in_memory()?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Returns the path to the database, if opened from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn parse_fields(path: &str, raw: &str) -> StoreResult<Fields> {
    match serde_json::from_str(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject {
            path: path.to_string(),
        }),
    }
}

fn read_fields(tx: &Transaction<'_>, path: &DocPath) -> StoreResult<Option<Fields>> {
    let raw: Option<String> = tx
        .query_row(
            "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
            params![path.collection(), path.id()],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|raw| parse_fields(&path.to_string(), &raw))
        .transpose()
}

fn write_fields(tx: &Transaction<'_>, path: &DocPath, data: &Fields, written_at: &str) -> StoreResult<()> {
    let raw = serde_json::to_string(data)?;
    tx.execute(
        "INSERT OR REPLACE INTO documents (collection, id, data, written_at) VALUES (?1, ?2, ?3, ?4)",
        params![path.collection(), path.id(), raw, written_at],
    )?;
    Ok(())
}

fn apply_op(tx: &Transaction<'_>, op: &WriteOp, now: chrono::DateTime<Utc>, written_at: &str) -> StoreResult<()> {
    match op {
        WriteOp::Create { path, data } => {
            if read_fields(tx, path)?.is_some() {
                return Err(StoreError::AlreadyExists {
                    path: path.to_string(),
                });
            }
            write_fields(tx, path, data, written_at)
        }
        WriteOp::Set { path, data } => write_fields(tx, path, data, written_at),
        WriteOp::Update { path, update } => {
            let mut data = read_fields(tx, path)?.ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })?;
            update.apply(&mut data, now);
            write_fields(tx, path, &data, written_at)
        }
        WriteOp::Delete { path } => {
            tx.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![path.collection(), path.id()],
            )?;
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        let path = path.clone();
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<Option<Document>> {
            let conn = conn.blocking_lock();
            let raw: Option<String> = conn
                .query_row(
                    "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                    params![path.collection(), path.id()],
                    |row| row.get(0),
                )
                .optional()?;
            raw.map(|raw| {
                parse_fields(&path.to_string(), &raw).map(|data| Document::new(path.id(), data))
            })
            .transpose()
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collection = collection.to_string();
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<Vec<Document>> {
            let conn = conn.blocking_lock();
            let mut stmt =
                conn.prepare("SELECT id, data FROM documents WHERE collection = ?1 ORDER BY id")?;
            let rows = stmt.query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut docs = Vec::new();
            for row in rows {
                let (id, raw) = row?;
                let data = parse_fields(&format!("{collection}/{id}"), &raw)?;
                docs.push(Document::new(id, data));
            }
            Ok(docs)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        batch.ensure_within_limit()?;
        if batch.is_empty() {
            return Ok(());
        }

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            let mut conn = conn.blocking_lock();
            let now = Utc::now();
            let written_at = timestamp_value(now)
                .as_str()
                .map(String::from)
                .unwrap_or_default();

            // Dropping the transaction on error rolls it back.
            let tx = conn.transaction()?;
            for op in batch.ops() {
                apply_op(&tx, op, now, &written_at)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }
}

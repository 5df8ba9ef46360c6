//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. `libsql::Connection` is
//! `Send + Sync` and safe for concurrent async use.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::traits::{Database, StoredMessage};

/// libSQL database backend.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and initialize the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to open database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Conversation database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to create database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS conversations (
                    thread_id  TEXT PRIMARY KEY,
                    title      TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS conversation_messages (
                    id         TEXT PRIMARY KEY,
                    thread_id  TEXT NOT NULL REFERENCES conversations(thread_id),
                    role       TEXT NOT NULL,
                    content    TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    seq        INTEGER
                );
                CREATE INDEX IF NOT EXISTS idx_messages_thread
                    ON conversation_messages(thread_id, seq);",
            )
            .await
            .map_err(|e| StoreError::Query(format!("Schema init failed: {e}")))?;
        Ok(())
    }
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Parse an RFC 3339 datetime string, falling back to the epoch floor.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn ensure_conversation(
        &self,
        thread_id: &str,
        title: Option<&str>,
    ) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO conversations (thread_id, title, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(thread_id) DO UPDATE SET updated_at = ?3",
                params![thread_id, opt_text(title), now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("ensure_conversation failed: {e}")))?;
        Ok(())
    }

    async fn append_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO conversation_messages (id, thread_id, role, content, created_at, seq)
                 VALUES (?1, ?2, ?3, ?4, ?5,
                    (SELECT COALESCE(MAX(seq), 0) + 1
                     FROM conversation_messages WHERE thread_id = ?2))",
                params![id, thread_id, role, content, now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("append_message failed: {e}")))?;
        debug!(thread_id, role, "Message persisted");
        Ok(())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<StoredMessage>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, role, content, created_at
                 FROM conversation_messages
                 WHERE thread_id = ?1
                 ORDER BY seq ASC",
                params![thread_id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("list_messages failed: {e}")))?;

        let mut messages = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("row read failed: {e}")))?
        {
            let id_str: String = row
                .get(0)
                .map_err(|e| StoreError::Query(format!("column read failed: {e}")))?;
            let role: String = row
                .get(1)
                .map_err(|e| StoreError::Query(format!("column read failed: {e}")))?;
            let content: String = row
                .get(2)
                .map_err(|e| StoreError::Query(format!("column read failed: {e}")))?;
            let created_str: String = row
                .get(3)
                .map_err(|e| StoreError::Query(format!("column read failed: {e}")))?;

            messages.push(StoredMessage {
                id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
                role,
                content,
                created_at: parse_datetime(&created_str),
            });
        }
        Ok(messages)
    }

    async fn delete_conversation(&self, thread_id: &str) -> Result<(), StoreError> {
        self.conn
            .execute(
                "DELETE FROM conversation_messages WHERE thread_id = ?1",
                params![thread_id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("delete messages failed: {e}")))?;
        self.conn
            .execute(
                "DELETE FROM conversations WHERE thread_id = ?1",
                params![thread_id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("delete conversation failed: {e}")))?;
        debug!(thread_id, "Conversation deleted from DB");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn backend() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    #[tokio::test]
    async fn append_and_list_preserves_order() {
        let db = backend().await;
        db.ensure_conversation("t1", Some("Recherche")).await.unwrap();
        db.append_message("t1", "user", "premier").await.unwrap();
        db.append_message("t1", "assistant", "deuxième").await.unwrap();
        db.append_message("t1", "user", "troisième").await.unwrap();

        let messages = db.list_messages("t1").await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "premier");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[2].content, "troisième");
    }

    #[tokio::test]
    async fn unknown_thread_lists_empty() {
        let db = backend().await;
        let messages = db.list_messages("nope").await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn ensure_conversation_is_idempotent() {
        let db = backend().await;
        db.ensure_conversation("t1", None).await.unwrap();
        db.ensure_conversation("t1", None).await.unwrap();
        db.append_message("t1", "user", "salut").await.unwrap();
        assert_eq!(db.list_messages("t1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_everything() {
        let db = backend().await;
        db.ensure_conversation("t1", None).await.unwrap();
        db.append_message("t1", "user", "salut").await.unwrap();
        db.delete_conversation("t1").await.unwrap();
        assert!(db.list_messages("t1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn local_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conv.db");
        {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.ensure_conversation("t1", None).await.unwrap();
            db.append_message("t1", "user", "persisté").await.unwrap();
        }
        let db = LibSqlBackend::new_local(&path).await.unwrap();
        let messages = db.list_messages("t1").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "persisté");
    }
}

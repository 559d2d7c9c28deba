//! Relational log store backed by SQLite
//!
//! Owns two tables: the registry of indexed documents and the
//! append-only chat turn log. The vector store holds the chunks; this
//! store holds everything the chunks are joined against.

mod schema;

pub use schema::*;

use crate::error::{Error, Result};
use crate::llm::{ChatMessage, Role};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use tracing::{debug, error, info};

/// A registered document
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub filename: String,
    pub uploaded_at: String,
}

/// A logged chat turn
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChatLogEntry {
    pub id: i64,
    pub session_id: String,
    pub user_query: String,
    pub model_response: String,
    pub model: String,
    pub created_at: String,
}

/// Registry and chat log counts
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub document_count: usize,
    pub turn_count: usize,
    pub session_count: usize,
}

/// Log store handle
#[derive(Clone)]
pub struct LogStore {
    pool: SqlitePool,
}

impl LogStore {
    /// Connect to the SQLite database, creating it if missing
    pub async fn connect(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Initialize the schema; idempotent and safe to call repeatedly
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check whether the schema has been created
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='documents'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }

    // ===== Document registry =====

    /// Register a document by filename, returning its new id
    ///
    /// A second registration of the same filename fails with
    /// [`Error::DuplicateName`] and leaves the registry unchanged.
    pub async fn register_document(&self, filename: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO documents (filename, uploaded_at) VALUES (?, ?)")
            .bind(filename)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_rowid();
                info!("Registered document '{}' with id {}", filename, id);
                Ok(id)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(Error::DuplicateName(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a document from the registry; deleting a missing id is a no-op
    pub async fn unregister_document(&self, id: i64) -> Result<()> {
        let done = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            debug!("Unregister of document id {} matched no rows", id);
        } else {
            info!("Unregistered document id {}", id);
        }
        Ok(())
    }

    /// Look up a single document record
    pub async fn get_document(&self, id: i64) -> Result<Option<DocumentRecord>> {
        let doc = sqlx::query_as::<_, DocumentRecord>("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc)
    }

    /// List registered documents, newest first
    ///
    /// A storage fault is logged and yields an empty list so callers
    /// rendering the registry never crash over it.
    pub async fn list_documents(&self) -> Vec<DocumentRecord> {
        let result = sqlx::query_as::<_, DocumentRecord>(
            "SELECT * FROM documents ORDER BY uploaded_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(docs) => docs,
            Err(e) => {
                error!("Failed to list documents: {}", e);
                Vec::new()
            }
        }
    }

    // ===== Chat log =====

    /// Append a chat turn to the log
    ///
    /// Storage errors are logged and swallowed: a broken log must never
    /// block a chat reply from reaching the user.
    pub async fn append_chat_turn(
        &self,
        session_id: &str,
        user_query: &str,
        model_response: &str,
        model: &str,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO chat_logs (session_id, user_query, model_response, model, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(session_id)
        .bind(user_query)
        .bind(model_response)
        .bind(model)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => debug!("Logged chat turn for session {}", session_id),
            Err(e) => error!("Failed to log chat turn for session {}: {}", session_id, e),
        }
    }

    /// Fetch a session's history as a flattened role/content sequence
    ///
    /// Turns come back in insertion order, each emitting a user message
    /// then an assistant message; empty fields are skipped. An unknown
    /// session id yields an empty sequence.
    pub async fn get_history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT user_query, model_response FROM chat_logs WHERE session_id = ? ORDER BY id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let mut messages = Vec::with_capacity(rows.len() * 2);
        for (user_query, model_response) in rows {
            if !user_query.is_empty() {
                messages.push(ChatMessage::new(Role::User, user_query));
            }
            if !model_response.is_empty() {
                messages.push(ChatMessage::new(Role::Assistant, model_response));
            }
        }
        Ok(messages)
    }

    /// Fetch a session's full transcript entries, oldest first
    pub async fn session_entries(&self, session_id: &str) -> Result<Vec<ChatLogEntry>> {
        let entries = sqlx::query_as::<_, ChatLogEntry>(
            "SELECT * FROM chat_logs WHERE session_id = ? ORDER BY id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    // ===== Statistics =====

    /// Counts over both tables
    pub async fn stats(&self) -> Result<StoreStats> {
        let document_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;

        let turn_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_logs")
            .fetch_one(&self.pool)
            .await?;

        let session_count: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT session_id) FROM chat_logs")
                .fetch_one(&self.pool)
                .await?;

        Ok(StoreStats {
            document_count: document_count as usize,
            turn_count: turn_count as usize,
            session_count: session_count as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_test_store() -> (LogStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = LogStore::connect(&tmp.path().join("test.db")).await.unwrap();
        store.init_schema().await.unwrap();
        (store, tmp)
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let (store, _tmp) = setup_test_store().await;
        assert!(store.is_initialized().await.unwrap());
        store.init_schema().await.unwrap();
        store.init_schema().await.unwrap();
        assert!(store.is_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn test_register_and_list_documents() {
        let (store, _tmp) = setup_test_store().await;

        let a = store.register_document("a.pdf").await.unwrap();
        let b = store.register_document("b.docx").await.unwrap();
        assert!(b > a);

        // Newest first; uploaded_at ties break on id
        let docs = store.list_documents().await;
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].filename, "b.docx");
        assert_eq!(docs[1].filename, "a.pdf");
    }

    #[tokio::test]
    async fn test_duplicate_filename_rejected() {
        let (store, _tmp) = setup_test_store().await;

        store.register_document("report.pdf").await.unwrap();
        let err = store.register_document("report.pdf").await.unwrap_err();
        assert!(matches!(err, Error::DuplicateName(ref name) if name == "report.pdf"));

        assert_eq!(store.list_documents().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unregister_missing_document_is_noop() {
        let (store, _tmp) = setup_test_store().await;
        store.unregister_document(42).await.unwrap();
        assert!(store.list_documents().await.is_empty());
    }

    #[tokio::test]
    async fn test_unregister_removes_document() {
        let (store, _tmp) = setup_test_store().await;
        let id = store.register_document("notes.html").await.unwrap();
        store.unregister_document(id).await.unwrap();
        assert!(store.get_document(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_history_round_trip_in_order() {
        let (store, _tmp) = setup_test_store().await;

        store
            .append_chat_turn("s1", "What is X?", "X is a thing.", "llama-3.1-8b-instant")
            .await;
        store
            .append_chat_turn("s1", "And Y?", "Y is another.", "llama-3.1-8b-instant")
            .await;
        store
            .append_chat_turn("s2", "Unrelated", "Sure.", "llama-3.1-8b-instant")
            .await;

        let history = store.get_history("s1").await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "What is X?");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, "X is a thing.");
        assert_eq!(history[2].content, "And Y?");
        assert_eq!(history[3].content, "Y is another.");
    }

    #[tokio::test]
    async fn test_history_skips_empty_fields() {
        let (store, _tmp) = setup_test_store().await;
        store.append_chat_turn("s1", "Hello?", "", "m").await;

        let history = store.get_history("s1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_history_unknown_session_is_empty() {
        let (store, _tmp) = setup_test_store().await;
        assert!(store.get_history("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let (store, _tmp) = setup_test_store().await;
        store.register_document("a.pdf").await.unwrap();
        store.append_chat_turn("s1", "q", "r", "m").await;
        store.append_chat_turn("s2", "q", "r", "m").await;

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.document_count, 1);
        assert_eq!(stats.turn_count, 2);
        assert_eq!(stats.session_count, 2);
    }
}

use rusqlite::{params, Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::middleware::AppError;
use crate::models::{Message, MessageRole, QueryResults};

/// SQLite storage for chat messages.
/// Uses tokio::Mutex for async-friendly locking.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub async fn new<P: AsRef<Path>>(db_path: P) -> SqliteResult<Self> {
        let path_str = db_path.as_ref().to_string_lossy();
        // Handle SQLite URL format (sqlite:./path or sqlite://path)
        let clean_path: &str = if path_str.starts_with("sqlite:") {
            path_str.trim_start_matches("sqlite:").trim_start_matches("//")
        } else {
            path_str.as_ref()
        };

        let conn = if clean_path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(clean_path)?
        };

        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                sql_query TEXT,
                query_results TEXT,
                timestamp INTEGER NOT NULL,
                error TEXT
            )
            "#,
            [],
        )?;
        Ok(())
    }

    pub async fn add_message(&self, message: &Message) -> Result<(), AppError> {
        let query_results = message
            .query_results
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Failed to serialize query results: {}", e)))?;

        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO messages (id, role, content, sql_query, query_results, timestamp, error)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                message.id,
                message.role.as_str(),
                message.content,
                message.sql_query,
                query_results,
                message.timestamp,
                message.error,
            ],
        )?;
        Ok(())
    }

    pub async fn get_messages(&self) -> Result<Vec<Message>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, role, content, sql_query, query_results, timestamp, error
            FROM messages
            ORDER BY timestamp ASC, rowid ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let role: String = row.get(1)?;
            let query_results: Option<String> = row.get(4)?;
            Ok(Message {
                id: row.get(0)?,
                role: MessageRole::from_str(&role),
                content: row.get(2)?,
                sql_query: row.get(3)?,
                query_results: query_results
                    .and_then(|json| serde_json::from_str::<QueryResults>(&json).ok()),
                timestamp: row.get(5)?,
                error: row.get(6)?,
            })
        })?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    pub async fn clear_messages(&self) -> Result<(), AppError> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM messages", [])?;
        Ok(())
    }
}

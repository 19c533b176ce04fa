// Database adapter trait binding generic operations to one query engine
use crate::api::middleware::AppError;
use crate::models::TableInfo;
use crate::services::database::DatabaseType;
use crate::services::schema_text::render_schema_text;
use serde_json::Value;

/// Normalized query execution result.
///
/// `rows` are JSON objects in result order. `row_count` is what the engine
/// reported and is authoritative for display; it can differ from `rows.len()`
/// when the engine counts rows independently of the fetched set.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
    pub row_count: usize,
}

/// Abstraction over heterogeneous SQL engines. Implementations are shared
/// across concurrent requests behind an `Arc`, so connection state lives in
/// interior mutability and every method takes `&self`.
#[async_trait::async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Establish the underlying connection or pool. Idempotent: a no-op when
    /// already connected. On failure the adapter stays disconnected and the
    /// cause is reported; adapters never retry internally.
    async fn connect(&self) -> Result<(), AppError>;

    /// Release the pool/handle. Best-effort, never fails the caller.
    async fn disconnect(&self);

    /// Execute a SQL statement, auto-connecting first if needed. A blank query
    /// is rejected before touching the engine; engine rejections carry the
    /// engine's raw error text.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult, AppError>;

    /// List user tables with columns in definition order. Produced fresh on
    /// every call because the schema can change between calls.
    async fn get_tables(&self) -> Result<Vec<TableInfo>, AppError>;

    /// Cheap read of connection state, no I/O
    fn is_connected(&self) -> bool;

    fn database_type(&self) -> DatabaseType;

    /// Textual schema description used to ground SQL generation
    async fn get_schema(&self) -> Result<String, AppError> {
        let tables = self.get_tables().await?;
        Ok(render_schema_text(&tables, self.database_type()))
    }
}

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use nlq_backend::api::middleware::AppError;
use nlq_backend::config::LlmConfig;
use nlq_backend::models::{ColumnInfo, TableInfo};
use nlq_backend::services::database::{DatabaseAdapter, DatabaseType, QueryResult};
use nlq_backend::services::llm_service::{ChatCompletion, CompletionRequest};
use nlq_backend::services::retry::RetryPolicy;

/// Completion client that replays a scripted sequence of provider outcomes.
/// `Err(text)` entries become `AppError::Generation(text)`, matching how the
/// real client reports provider failures.
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<Result<String, String>>>,
    pub calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatCompletion for ScriptedCompletion {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .responses
            .lock()
            .await
            .pop_front()
            .expect("scripted completion ran out of responses");
        next.map_err(AppError::Generation)
    }
}

/// In-memory adapter that counts lifecycle calls and serves a fixed result.
pub struct MockAdapter {
    pub connects: AtomicUsize,
    pub executes: AtomicUsize,
    connected: AtomicBool,
    connect_delay: Duration,
    result: QueryResult,
    tables: Vec<TableInfo>,
    execute_error: Option<String>,
}

impl MockAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connects: AtomicUsize::new(0),
            executes: AtomicUsize::new(0),
            connected: AtomicBool::new(false),
            connect_delay: Duration::from_millis(5),
            result: employees_result(),
            tables: employees_tables(),
            execute_error: None,
        })
    }

    pub fn failing_execute(error: &str) -> Arc<Self> {
        Arc::new(Self {
            connects: AtomicUsize::new(0),
            executes: AtomicUsize::new(0),
            connected: AtomicBool::new(false),
            connect_delay: Duration::from_millis(0),
            result: employees_result(),
            tables: employees_tables(),
            execute_error: Some(error.to_string()),
        })
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn execute_count(&self) -> usize {
        self.executes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseAdapter for MockAdapter {
    async fn connect(&self) -> Result<(), AppError> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        // Widens the race window for concurrency tests
        tokio::time::sleep(self.connect_delay).await;
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult, AppError> {
        self.executes.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.execute_error {
            return Err(AppError::QueryExecution(error.clone()));
        }
        Ok(self.result.clone())
    }

    async fn get_tables(&self) -> Result<Vec<TableInfo>, AppError> {
        Ok(self.tables.clone())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSql
    }
}

pub fn employees_tables() -> Vec<TableInfo> {
    vec![TableInfo::new(
        "employees",
        vec![
            ColumnInfo::new("id", "integer", false),
            ColumnInfo::new("name", "text", false),
            ColumnInfo::new("department", "text", false),
            ColumnInfo::new("salary", "integer", false),
        ],
    )]
}

pub fn employees_result() -> QueryResult {
    let names = [
        "Иванов Иван",
        "Петрова Мария",
        "Сидоров Петр",
        "Козлова Анна",
        "Николаев Алексей",
        "Федорова Елена",
        "Морозов Дмитрий",
        "Васильева Ольга",
    ];
    let rows: Vec<serde_json::Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| serde_json::json!({ "id": i + 1, "name": name }))
        .collect();
    QueryResult {
        columns: vec!["id".to_string(), "name".to_string()],
        rows,
        row_count: 8,
    }
}

pub fn test_llm_config() -> LlmConfig {
    LlmConfig {
        provider: "openai".to_string(),
        model: "gpt-4".to_string(),
        base_url: "http://localhost:9/v1".to_string(),
        api_key: None,
        temperature: 0.1,
        max_tokens: 2048,
    }
}

/// Backoff measured in milliseconds so retry tests finish instantly
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
    }
}

pub fn generation_json(sql: &str, explanation: &str) -> String {
    serde_json::json!({ "sqlQuery": sql, "explanation": explanation }).to_string()
}

// Database abstraction layer: one trait, two engine variants
pub mod adapter;
pub mod clickhouse;
pub mod postgresql;
pub mod registry;

pub use adapter::{DatabaseAdapter, QueryResult};
pub use clickhouse::ClickHouseAdapter;
pub use postgresql::PostgreSqlAdapter;
pub use registry::AdapterRegistry;

use crate::api::middleware::AppError;
use std::sync::Arc;

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    PostgreSql,
    ClickHouse,
}

impl DatabaseType {
    pub fn from_str(s: &str) -> Result<Self, AppError> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(DatabaseType::PostgreSql),
            "clickhouse" => Ok(DatabaseType::ClickHouse),
            _ => Err(AppError::Validation(format!(
                "Unsupported database type: {}",
                s
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::PostgreSql => "postgresql",
            DatabaseType::ClickHouse => "clickhouse",
        }
    }
}

/// Factory for the adapter matching the configured engine. The adapter is not
/// connected yet; `connect()` is the registry's job.
pub fn create_adapter(
    db_type: DatabaseType,
    connection_url: &str,
    database: Option<&str>,
) -> Result<Arc<dyn DatabaseAdapter>, AppError> {
    match db_type {
        DatabaseType::PostgreSql => Ok(Arc::new(PostgreSqlAdapter::new(connection_url)?)),
        DatabaseType::ClickHouse => Ok(Arc::new(ClickHouseAdapter::new(connection_url, database)?)),
    }
}

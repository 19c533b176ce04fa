pub mod chat;
pub mod info;

use crate::config::Config;
use crate::services::database::AdapterRegistry;
use crate::services::LlmService;
use crate::storage::SqliteStorage;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AdapterRegistry>,
    pub llm: Arc<LlmService>,
    pub storage: Arc<SqliteStorage>,
    pub config: Config,
}

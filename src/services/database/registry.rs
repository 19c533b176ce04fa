// Process-wide adapter cache: at most one live adapter instance.
use crate::api::middleware::AppError;
use crate::config::DatabaseConfig;
use crate::services::database::{create_adapter, DatabaseAdapter, DatabaseType};
use std::sync::Arc;
use tokio::sync::Mutex;

type AdapterFactory =
    Box<dyn Fn() -> Result<Arc<dyn DatabaseAdapter>, AppError> + Send + Sync>;

/// Owns the single live adapter. `get()` lazily constructs and connects it;
/// while the connection stays healthy every caller shares the same instance.
/// The mutex is held across construction and connect, so concurrent callers
/// racing an empty cache single-flight into one `connect()`.
pub struct AdapterRegistry {
    db_type: DatabaseType,
    factory: AdapterFactory,
    current: Mutex<Option<Arc<dyn DatabaseAdapter>>>,
}

impl AdapterRegistry {
    pub fn new(config: DatabaseConfig) -> Result<Self, AppError> {
        let db_type = DatabaseType::from_str(&config.engine)?;
        let factory: AdapterFactory = Box::new(move || {
            create_adapter(db_type, &config.url, config.name.as_deref())
        });
        Ok(Self {
            db_type,
            factory,
            current: Mutex::new(None),
        })
    }

    /// Registry backed by an arbitrary factory; used by tests to inject mock
    /// adapters without touching a real engine.
    pub fn with_factory(db_type: DatabaseType, factory: AdapterFactory) -> Self {
        Self {
            db_type,
            factory,
            current: Mutex::new(None),
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        self.db_type
    }

    /// Return the live adapter, constructing and connecting one if needed.
    /// A failed connect leaves the cache empty so the next call retries fresh.
    pub async fn get(&self) -> Result<Arc<dyn DatabaseAdapter>, AppError> {
        let mut current = self.current.lock().await;

        if let Some(adapter) = current.as_ref() {
            if adapter.is_connected() {
                return Ok(adapter.clone());
            }
        }

        let adapter = (self.factory)()?;
        adapter.connect().await?;
        *current = Some(adapter.clone());

        tracing::info!(
            db_type = self.db_type.as_str(),
            "Database adapter connected"
        );
        Ok(adapter)
    }

    /// Disconnect and drop the cached adapter. Used at orderly shutdown.
    pub async fn reset(&self) {
        if let Some(adapter) = self.current.lock().await.take() {
            adapter.disconnect().await;
        }
    }
}

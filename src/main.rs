use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use nlq_backend::api;
use nlq_backend::api::handlers::AppState;
use nlq_backend::config::Config;
use nlq_backend::services::database::AdapterRegistry;
use nlq_backend::services::LlmService;
use nlq_backend::storage::SqliteStorage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        "LLM Provider: {}, Model: {}",
        config.llm.provider, config.llm.model
    );
    info!("Database Type: {}", config.database.engine);

    // Initialize message storage
    let storage = Arc::new(SqliteStorage::new(&config.storage.path).await.map_err(|e| {
        error!("Failed to initialize message storage: {}", e);
        e
    })?);

    // The registry lazily connects the single adapter on first use
    let registry = Arc::new(AdapterRegistry::new(config.database.clone())?);
    let llm = Arc::new(LlmService::new(&config.llm));

    let state = AppState {
        registry: registry.clone(),
        llm,
        storage,
        config: config.clone(),
    };

    let app = api::routes::create_router_with_state(state);

    let addr: SocketAddr = config.server_address().parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server closed, disconnecting database adapter...");
    registry.reset().await;
    info!("Database adapter disconnected");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down gracefully...");
}

use axum::{extract::State, Json};
use serde_json::json;

use crate::api::handlers::AppState;
use crate::api::middleware::AppError;

/// Chat history in timestamp order
pub async fn list_messages(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let messages = state.storage.get_messages().await?;
    Ok(Json(json!({ "messages": messages })))
}

/// Redacted view of the active configuration: no URLs, no keys
pub async fn active_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "llm": {
            "provider": state.config.llm.provider,
            "model": state.config.llm.model,
        },
        "database": {
            "type": state.config.database.engine,
        },
    }))
}

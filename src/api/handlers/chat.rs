use axum::{extract::State, Json};
use std::time::Instant;

use crate::api::handlers::AppState;
use crate::api::middleware::AppError;
use crate::models::{ChatRequest, Message, QueryResults};

/// One chat turn: persist the user question, generate SQL against the live
/// schema, execute it, and answer with a structured assistant message.
///
/// Generation failures, policy-blocked queries and execution errors all come
/// back as normal messages with an `error` field, never as a bare 5xx, so the
/// UI renders "why nothing happened" the same way as a legitimate empty
/// result.
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<Message>, AppError> {
    let question = payload.message.trim();
    if question.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }

    let user_message = Message::user(question);
    state.storage.add_message(&user_message).await?;

    let adapter = state.registry.get().await?;
    let db_type = state.registry.database_type();
    let schema_text = adapter.get_schema().await?;

    let generated = match state.llm.generate(question, &schema_text, db_type).await {
        Ok(generated) => generated,
        Err(e) => {
            let reason = e.to_string();
            let message = Message::assistant(format!("Ошибка генерации SQL: {}", reason))
                .with_error(reason);
            state.storage.add_message(&message).await?;
            return Ok(Json(message));
        }
    };

    if generated.sql_query.is_empty() {
        let content = if generated.explanation.is_empty() {
            "Не удалось сгенерировать SQL запрос для данного вопроса.".to_string()
        } else {
            generated.explanation
        };
        let message =
            Message::assistant(content).with_error("Невозможно построить SQL запрос".to_string());
        state.storage.add_message(&message).await?;
        return Ok(Json(message));
    }

    let started = Instant::now();
    let message = match adapter.execute_query(&generated.sql_query).await {
        Ok(result) => {
            let execution_time = started.elapsed().as_secs_f64() * 1000.0;
            Message::assistant(generated.explanation)
                .with_sql_query(generated.sql_query)
                .with_query_results(QueryResults {
                    columns: result.columns,
                    rows: result.rows,
                    row_count: result.row_count,
                    execution_time,
                })
        }
        Err(e) => {
            let error = format!("Ошибка выполнения SQL: {}", e);
            Message::assistant(error.clone())
                .with_sql_query(generated.sql_query)
                .with_error(error)
        }
    };

    state.storage.add_message(&message).await?;
    Ok(Json(message))
}

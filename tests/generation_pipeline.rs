//! End-to-end tests for the SQL generation pipeline: retry envelope,
//! response parsing, and the read-only safety gate.

mod common;

use common::{fast_retry, generation_json, test_llm_config, ScriptedCompletion};
use nlq_backend::services::database::DatabaseType;
use nlq_backend::services::llm_service::LlmService;

const SCHEMA: &str = "1. employees:\n   - id: integer\n   - name: text";

fn service(client: std::sync::Arc<ScriptedCompletion>, max_attempts: u32) -> LlmService {
    LlmService::with_client(&test_llm_config(), client, fast_retry(max_attempts))
}

#[tokio::test]
async fn rate_limited_attempts_are_retried_until_success() {
    let client = ScriptedCompletion::new(vec![
        Err("LLM API error 429: too many requests".to_string()),
        Err("You exceeded your current quota".to_string()),
        Ok(generation_json("SELECT * FROM employees", "Все сотрудники")),
    ]);

    let result = service(client.clone(), 6)
        .generate("покажи сотрудников", SCHEMA, DatabaseType::PostgreSql)
        .await
        .unwrap();

    assert_eq!(client.call_count(), 3);
    assert_eq!(result.sql_query, "SELECT * FROM employees");
    assert_eq!(result.explanation, "Все сотрудники");
}

#[tokio::test]
async fn persistent_rate_limiting_exhausts_the_attempt_budget() {
    let responses = (0..3)
        .map(|_| Err("LLM API error 429: slow down".to_string()))
        .collect();
    let client = ScriptedCompletion::new(responses);

    let error = service(client.clone(), 3)
        .generate("вопрос", SCHEMA, DatabaseType::PostgreSql)
        .await
        .unwrap_err();

    assert_eq!(client.call_count(), 3);
    assert!(error.to_string().contains("Ошибка генерации SQL запроса"));
    assert!(error.to_string().contains("429"));
}

#[tokio::test]
async fn non_rate_limit_failure_aborts_without_retry() {
    let client = ScriptedCompletion::new(vec![
        Err("connection refused".to_string()),
        Ok(generation_json("SELECT 1", "никогда не доходит")),
    ]);

    let error = service(client.clone(), 6)
        .generate("вопрос", SCHEMA, DatabaseType::PostgreSql)
        .await
        .unwrap_err();

    assert_eq!(client.call_count(), 1);
    assert!(error.to_string().contains("connection refused"));
}

#[tokio::test]
async fn malformed_payload_fails_after_one_attempt() {
    let client = ScriptedCompletion::new(vec![
        Ok("вот ваш запрос: SELECT * FROM employees".to_string()),
        Ok(generation_json("SELECT 1", "никогда не доходит")),
    ]);

    let error = service(client.clone(), 6)
        .generate("вопрос", SCHEMA, DatabaseType::PostgreSql)
        .await
        .unwrap_err();

    assert_eq!(client.call_count(), 1);
    assert!(error.to_string().contains("Некорректный ответ от AI модели"));
}

#[tokio::test]
async fn unsafe_query_is_blocked_with_a_reason() {
    let client = ScriptedCompletion::new(vec![Ok(generation_json(
        "DELETE FROM employees WHERE id = 1",
        "удалить сотрудника",
    ))]);

    let result = service(client, 6)
        .generate("удали сотрудника", SCHEMA, DatabaseType::PostgreSql)
        .await
        .unwrap();

    assert!(result.sql_query.is_empty());
    assert!(result.explanation.contains("DELETE"));
}

#[tokio::test]
async fn model_may_decline_with_an_explanation() {
    let client = ScriptedCompletion::new(vec![Ok(generation_json(
        "",
        "Вопрос не относится к данным в базе",
    ))]);

    let result = service(client, 6)
        .generate("какая погода?", SCHEMA, DatabaseType::PostgreSql)
        .await
        .unwrap();

    assert!(result.sql_query.is_empty());
    assert_eq!(result.explanation, "Вопрос не относится к данным в базе");
}

#[tokio::test]
async fn json_wrapped_in_prose_still_parses() {
    let payload = format!(
        "Конечно!\n{}\nНадеюсь, помогло.",
        generation_json("SELECT count(*) FROM employees", "Число сотрудников")
    );
    let client = ScriptedCompletion::new(vec![Ok(payload)]);

    let result = service(client, 6)
        .generate("сколько сотрудников?", SCHEMA, DatabaseType::PostgreSql)
        .await
        .unwrap();

    assert_eq!(result.sql_query, "SELECT count(*) FROM employees");
}

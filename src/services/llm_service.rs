//! Text-to-SQL generation pipeline.
//!
//! Composes the grounding schema text and the user question into an
//! OpenAI-compatible chat completion request, parses the structured JSON
//! response, runs the read-only safety check, and retries rate-limited calls
//! with exponential backoff. A blocked query is not a pipeline error: the
//! rejection reason comes back as the explanation with an empty `sql_query`.

use crate::api::middleware::AppError;
use crate::config::LlmConfig;
use crate::services::database::DatabaseType;
use crate::services::retry::{is_rate_limit_error, RetryDecision, RetryPolicy};
use crate::validation::{validate, ValidationOutcome};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Outcome of one generation call. Invariant: a non-empty `sql_query` has
/// already passed the safety validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub sql_query: String,
    pub explanation: String,
}

/// One fully-built completion request. Optional fields reflect what the
/// target model accepts: gpt-5 models take `max_completion_tokens` and no
/// temperature, everything else takes `temperature` + `max_tokens`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_completion_tokens: Option<u32>,
    /// Request a JSON-object-shaped response where the provider supports it
    pub json_response: bool,
}

/// Seam over the external completion capability so the pipeline is testable
/// without a provider.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Returns the raw text payload of the completion
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError>;
}

/// Real client for OpenAI-compatible chat completion APIs (OpenAI, Ollama,
/// custom gateways).
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http: HttpClient::new(),
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError> {
        let mut body = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(max_completion_tokens) = request.max_completion_tokens {
            body["max_completion_tokens"] = json!(max_completion_tokens);
        }
        if request.json_response {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let url = format!("{}/chat/completions", self.base_url);
        let mut http_request = self.http.post(&url).json(&body);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("LLM request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            // Status code stays in the message so rate-limit classification
            // can see "429"
            return Err(AppError::Generation(format!(
                "LLM API error {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse LLM response: {}", e)))?;

        Ok(payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("{}")
            .to_string())
    }
}

/// Dialect-specific syntax notes, selected by the configured engine tag
fn dialect_notes(db_type: DatabaseType) -> &'static str {
    match db_type {
        DatabaseType::ClickHouse => {
            "\n- Используй ClickHouse-специфичный синтаксис\
             \n- Для агрегаций используй функции типа sumIf, countIf, avgIf\
             \n- Используй toDate(), toDateTime() для работы с датами\
             \n- Для LIMIT используй стандартный синтаксис LIMIT n\
             \n- Строковые функции: lower(), upper(), trim(), substring()\
             \n- Для получения текущей даты: today(), now()"
        }
        DatabaseType::PostgreSql => {
            "\n- Используй PostgreSQL синтаксис\
             \n- Для дат: DATE, TIMESTAMP, CURRENT_DATE\
             \n- Строковые функции: LOWER(), UPPER(), TRIM(), SUBSTRING()\
             \n- Для LIMIT: LIMIT n OFFSET m"
        }
    }
}

fn system_prompt(schema_text: &str, db_type: DatabaseType) -> String {
    let sql_dialect = match db_type {
        DatabaseType::ClickHouse => "ClickHouse SQL",
        DatabaseType::PostgreSql => "PostgreSQL",
    };

    format!(
        "Ты - эксперт по SQL запросам. Твоя задача - преобразовать вопросы пользователя \
         на естественном языке в корректные {sql_dialect} запросы.\n\n\
         База данных имеет следующую схему:\n{schema_text}\n\n\
         Правила:\n\
         1. Генерируй только SELECT запросы (без INSERT, UPDATE, DELETE, DROP, ALTER)\n\
         2. Используй правильный синтаксис {sql_dialect}\n{notes}\n\
         3. Возвращай результат в формате JSON: {{ \"sqlQuery\": \"...\", \"explanation\": \"...\" }}\n\
         4. В explanation кратко объясни что делает запрос на русском языке\n\
         5. Не добавляй markdown форматирование, только чистый JSON\n\
         6. Если вопрос неясен или невозможно построить запрос, верни sqlQuery как пустую \
         строку и объяснение в explanation",
        sql_dialect = sql_dialect,
        schema_text = schema_text,
        notes = dialect_notes(db_type),
    )
}

/// Parse the model's text payload into a GenerationResult. Falls back to the
/// first `{...}` substring when the payload is not pure JSON. Failures here
/// are never retryable: the output is malformed, not transient.
fn parse_generation(content: &str) -> Result<GenerationResult, String> {
    let parsed: Value = serde_json::from_str(content)
        .or_else(|_| {
            let start = content.find('{');
            let end = content.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if start < end => {
                    serde_json::from_str(&content[start..=end])
                }
                _ => serde_json::from_str(content),
            }
        })
        .map_err(|_| "Некорректный ответ от AI модели".to_string())?;

    let sql_query = parsed.get("sqlQuery").and_then(Value::as_str);
    let explanation = parsed.get("explanation").and_then(Value::as_str);

    match (sql_query, explanation) {
        (Some(sql_query), Some(explanation)) => Ok(GenerationResult {
            sql_query: sql_query.trim().to_string(),
            explanation: explanation.to_string(),
        }),
        _ => Err("Неверная структура ответа от AI модели".to_string()),
    }
}

enum AttemptError {
    Retryable(String),
    Fatal(String),
}

pub struct LlmService {
    config: LlmConfig,
    client: Arc<dyn ChatCompletion>,
    retry: RetryPolicy,
}

impl LlmService {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            config: config.clone(),
            client: Arc::new(OpenAiClient::new(config)),
            retry: RetryPolicy::default(),
        }
    }

    /// Pipeline with an injected completion client and retry policy; used by
    /// tests to drive the envelope without network calls.
    pub fn with_client(
        config: &LlmConfig,
        client: Arc<dyn ChatCompletion>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            config: config.clone(),
            client,
            retry,
        }
    }

    fn build_request(
        &self,
        user_message: &str,
        schema_text: &str,
        db_type: DatabaseType,
    ) -> CompletionRequest {
        let is_gpt5 = self.config.model.contains("gpt-5");

        CompletionRequest {
            model: self.config.model.clone(),
            system_prompt: system_prompt(schema_text, db_type),
            user_prompt: format!(
                "Вопрос пользователя: {}\n\nСгенерируй SQL запрос для ответа на этот вопрос.",
                user_message
            ),
            temperature: (!is_gpt5).then_some(self.config.temperature),
            max_tokens: (!is_gpt5).then_some(self.config.max_tokens),
            max_completion_tokens: is_gpt5.then_some(self.config.max_tokens),
            json_response: self.config.provider != "ollama",
        }
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<GenerationResult, AttemptError> {
        let content = self.client.complete(request).await.map_err(|e| {
            let message = e.to_string();
            if is_rate_limit_error(&message) {
                AttemptError::Retryable(message)
            } else {
                AttemptError::Fatal(message)
            }
        })?;

        let parsed = parse_generation(&content).map_err(|reason| {
            tracing::error!(content = %content, "Failed to parse LLM response");
            AttemptError::Fatal(reason)
        })?;

        if parsed.sql_query.is_empty() {
            return Ok(GenerationResult {
                sql_query: String::new(),
                explanation: default_explanation(parsed.explanation),
            });
        }

        match validate(&parsed.sql_query) {
            ValidationOutcome::Safe => Ok(GenerationResult {
                sql_query: parsed.sql_query,
                explanation: default_explanation(parsed.explanation),
            }),
            ValidationOutcome::Blocked { reason } => {
                // Policy violations are user-facing information, not errors
                tracing::warn!(sql = %parsed.sql_query, %reason, "Blocked unsafe SQL query");
                Ok(GenerationResult {
                    sql_query: String::new(),
                    explanation: reason,
                })
            }
        }
    }

    /// Generate a validated SQL query for a user question. Only rate-limit
    /// failures consume retries; malformed output aborts immediately.
    pub async fn generate(
        &self,
        user_message: &str,
        schema_text: &str,
        db_type: DatabaseType,
    ) -> Result<GenerationResult, AppError> {
        tracing::info!(
            provider = %self.config.provider,
            model = %self.config.model,
            "[LLM] generating SQL query"
        );

        let request = self.build_request(user_message, schema_text, db_type);
        let mut attempt: u32 = 0;

        loop {
            match self.attempt(&request).await {
                Ok(result) => return Ok(result),
                Err(AttemptError::Fatal(message)) => {
                    return Err(AppError::Generation(format!(
                        "Ошибка генерации SQL запроса: {}",
                        message
                    )));
                }
                Err(AttemptError::Retryable(message)) => match self.retry.after_failure(attempt) {
                    RetryDecision::Retry { delay } => {
                        tracing::warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "[LLM] rate limited, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::GiveUp => {
                        return Err(AppError::Generation(format!(
                            "Ошибка генерации SQL запроса: {}",
                            message
                        )));
                    }
                },
            }
        }
    }
}

fn default_explanation(explanation: String) -> String {
    if explanation.is_empty() {
        "Не удалось сгенерировать объяснение".to_string()
    } else {
        explanation
    }
}

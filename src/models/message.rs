use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Executed query results attached to an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResults {
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
    pub row_count: usize,
    /// Wall-clock execution time in milliseconds, measured by the caller
    pub execution_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "user" => MessageRole::User,
            "system" => MessageRole::System,
            _ => MessageRole::Assistant,
        }
    }
}

/// One chat message. This is both the wire shape (camelCase JSON) and what
/// the storage layer persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub sql_query: Option<String>,
    pub query_results: Option<QueryResults>,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub error: Option<String>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: format!("msg-{}", Uuid::new_v4()),
            role,
            content: content.into(),
            sql_query: None,
            query_results: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
            error: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_sql_query(mut self, sql: impl Into<String>) -> Self {
        self.sql_query = Some(sql.into());
        self
    }

    pub fn with_query_results(mut self, results: QueryResults) -> Self {
        self.query_results = Some(results);
        self
    }
}

/// Incoming chat request body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_format_is_camel_case() {
        let message = Message::assistant("готово")
            .with_sql_query("SELECT 1")
            .with_query_results(QueryResults {
                columns: vec!["?column?".to_string()],
                rows: vec![serde_json::json!({"?column?": 1})],
                row_count: 1,
                execution_time: 1.5,
            });

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["sqlQuery"], "SELECT 1");
        assert_eq!(json["queryResults"]["rowCount"], 1);
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [MessageRole::User, MessageRole::Assistant, MessageRole::System] {
            assert_eq!(MessageRole::from_str(role.as_str()), role);
        }
    }
}

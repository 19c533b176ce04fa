use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Target database engine configuration. `engine` is "postgresql" or
/// "clickhouse"; `name` is the database/schema name where the engine needs one
/// (ClickHouse).
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub engine: String,
    pub url: String,
    pub name: Option<String>,
}

/// LLM completion provider configuration. Providers are "openai", "ollama" or
/// "custom"; all of them speak the OpenAI-compatible chat completions API.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// SQLite path for chat message storage
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env first so its values are visible below
        let _ = dotenv::dotenv();

        let engine = env::var("DATABASE_TYPE").unwrap_or_else(|_| "postgresql".to_string());
        let provider = env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());

        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("database.engine", engine.clone())?
            .set_default("database.url", "")?
            .set_default("database.name", None::<String>)?
            .set_default("llm.provider", provider.clone())?
            .set_default("llm.api_key", None::<String>)?
            .set_default("llm.temperature", 0.1)?
            .set_default("llm.max_tokens", 2048)?
            .set_default("storage.path", "./data.db")?
            .set_default("logging.level", "info")?;

        // Per-engine connection defaults
        builder = match engine.as_str() {
            "clickhouse" => {
                let url = env::var("CLICKHOUSE_URL")
                    .unwrap_or_else(|_| "http://localhost:8123".to_string());
                let name =
                    env::var("CLICKHOUSE_DATABASE").unwrap_or_else(|_| "default".to_string());
                builder
                    .set_override("database.url", url)?
                    .set_override("database.name", Some(name))?
            }
            _ => {
                let mut b = builder;
                if let Ok(url) = env::var("DATABASE_URL") {
                    b = b.set_override("database.url", url)?;
                }
                if let Ok(name) = env::var("PGDATABASE") {
                    b = b.set_override("database.name", Some(name))?;
                }
                b
            }
        };

        // Per-provider model defaults
        builder = match provider.as_str() {
            "ollama" => builder
                .set_default(
                    "llm.model",
                    env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.1".to_string()),
                )?
                .set_default(
                    "llm.base_url",
                    env::var("OLLAMA_BASE_URL")
                        .unwrap_or_else(|_| "http://localhost:11434/v1".to_string()),
                )?,
            "custom" => {
                let mut b = builder
                    .set_default(
                        "llm.model",
                        env::var("CUSTOM_LLM_MODEL").unwrap_or_else(|_| "gpt-4".to_string()),
                    )?
                    .set_default(
                        "llm.base_url",
                        env::var("CUSTOM_LLM_BASE_URL").unwrap_or_default(),
                    )?;
                if let Ok(api_key) = env::var("CUSTOM_LLM_API_KEY") {
                    b = b.set_override("llm.api_key", Some(api_key))?;
                }
                b
            }
            _ => {
                let mut b = builder
                    .set_default(
                        "llm.model",
                        env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-5".to_string()),
                    )?
                    .set_default(
                        "llm.base_url",
                        env::var("OPENAI_BASE_URL")
                            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                    )?;
                if let Ok(api_key) = env::var("OPENAI_API_KEY") {
                    b = b.set_override("llm.api_key", Some(api_key))?;
                }
                b
            }
        };

        if let Ok(host) = env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port.parse::<u16>().unwrap_or(5000))?;
        }

        if let Ok(temperature) = env::var("LLM_TEMPERATURE") {
            builder =
                builder.set_override("llm.temperature", temperature.parse::<f64>().unwrap_or(0.1))?;
        }

        if let Ok(max_tokens) = env::var("LLM_MAX_TOKENS") {
            builder =
                builder.set_override("llm.max_tokens", max_tokens.parse::<u32>().unwrap_or(2048))?;
        }

        if let Ok(path) = env::var("STORAGE_PATH") {
            builder = builder.set_override("storage.path", path)?;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        // Clear environment variables for this test
        env::remove_var("DATABASE_TYPE");
        env::remove_var("LLM_PROVIDER");
        env::remove_var("HOST");
        env::remove_var("PORT");

        let config = Config::from_env().unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.engine, "postgresql");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-5");
        assert_eq!(config.llm.max_tokens, 2048);
    }
}

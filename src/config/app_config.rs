use std::env;

use serde::Deserialize;

use crate::domain::ingestion::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::domain::rag::prompt::DEFAULT_HISTORY_LIMIT;
use crate::infrastructure::embedding::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE_URL,
    DEFAULT_OPENAI_EMBEDDING_MODEL,
};
use crate::infrastructure::llm::DEFAULT_ANTHROPIC_BASE_URL;
use crate::infrastructure::vector_store::{DEFAULT_DIMENSIONS, DEFAULT_TABLE_NAME};

/// Unprefixed alias for `rag.top_k`
const TOP_K_ALIAS: &str = "RAG_TOP_K";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub database: DatabaseConfig,
    pub vector_store: VectorStoreConfig,
    pub rag: RagConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

/// PostgreSQL connection pool settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreBackend {
    #[default]
    Pgvector,
    /// Test and offline use only
    InMemory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub backend: VectorStoreBackend,
    pub table_name: String,
    pub dimensions: usize,
}

/// Retrieval and ingestion tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub history_limit: usize,
    pub embedding_batch_size: usize,
    pub provider_timeout_secs: u64,
}

/// Provider endpoints and embedding model names
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai_base_url: String,
    pub gemini_base_url: String,
    pub anthropic_base_url: String,
    pub openai_embedding_model: String,
    pub gemini_embedding_model: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/knowledge_rag".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorStoreBackend::default(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            history_limit: DEFAULT_HISTORY_LIMIT,
            embedding_batch_size: 100,
            provider_timeout_secs: 60,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            openai_embedding_model: DEFAULT_OPENAI_EMBEDDING_MODEL.to_string(),
            gemini_embedding_model: DEFAULT_GEMINI_EMBEDDING_MODEL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        // the prefixed variable wins when both are set
        if env::var("APP__RAG__TOP_K").is_err() {
            if let Some(top_k) = top_k_alias()? {
                builder = builder.set_override("rag.top_k", top_k as i64)?;
            }
        }

        builder.build()?.try_deserialize()
    }
}

fn top_k_alias() -> Result<Option<u64>, config::ConfigError> {
    match env::var(TOP_K_ALIAS) {
        Ok(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
            config::ConfigError::Message(format!(
                "{} must be a non-negative integer, got '{}'",
                TOP_K_ALIAS, raw
            ))
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert!(config.metrics.enabled);
        assert_eq!(config.vector_store.backend, VectorStoreBackend::Pgvector);
        assert_eq!(config.vector_store.dimensions, 1536);
        assert_eq!(config.rag.top_k, 4);
        assert_eq!(config.rag.chunk_size, 1000);
        assert_eq!(config.rag.chunk_overlap, 200);
        assert_eq!(config.rag.history_limit, 12);
        assert_eq!(config.providers.gemini_embedding_model, "text-embedding-004");
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "rag": {"top_k": 6},
            "vector_store": {"backend": "in_memory", "dimensions": 768}
        }))
        .unwrap();

        assert_eq!(config.rag.top_k, 6);
        assert_eq!(config.rag.chunk_size, 1000);
        assert_eq!(config.vector_store.backend, VectorStoreBackend::InMemory);
        assert_eq!(config.vector_store.table_name, "kb_chunks");
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_log_format_parsing() {
        let logging: LoggingConfig =
            serde_json::from_value(serde_json::json!({"level": "debug", "format": "json"})).unwrap();
        assert!(matches!(logging.format, LogFormat::Json));
    }
}

//! Knowledge RAG
//!
//! Multi-tenant retrieval-augmented answering over uploaded documents:
//! - Per-knowledge-base chunk storage in PostgreSQL with pgvector
//! - OpenAI, Gemini and Anthropic providers selected from a persisted configuration
//! - Citation-numbered answers with a plain-text completion fallback

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use config::VectorStoreBackend;
use domain::provider_config::ProviderConfigRepository;
use infrastructure::{
    credentials::{CredentialSource, EnvCredentialSource},
    database,
    embedding::OpenAiEmbeddings,
    http_client::HttpClient,
    provider::ProviderRegistry,
    provider_config::{InMemoryProviderConfigRepository, PostgresProviderConfigRepository},
    services::{ConfigService, RagService, RagSettings},
    vector_store::create_vector_store,
};
use tracing::{info, warn};

/// Connection attempts to provider APIs give up after this long
const PROVIDER_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Width the configured OpenAI embedding model produces when it disagrees
/// with the vector column
fn embedding_dimension_mismatch(config: &AppConfig) -> Option<usize> {
    OpenAiEmbeddings::known_dimensions(&config.providers.openai_embedding_model)
        .filter(|dims| *dims != config.vector_store.dimensions)
}

/// Create the application state with all services initialized
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let settings = RagSettings::from_config(&config.rag)?;

    info!("Vector store backend: {:?}", config.vector_store.backend);

    if let Some(model_dimensions) = embedding_dimension_mismatch(config) {
        warn!(
            model = %config.providers.openai_embedding_model,
            model_dimensions,
            column_dimensions = config.vector_store.dimensions,
            "Embedding model width does not match vector_store.dimensions; inserts will fail"
        );
    }

    // Only the pgvector backend needs a database; the configuration record
    // lives next to the chunks when it has one
    let pool = match config.vector_store.backend {
        VectorStoreBackend::Pgvector => {
            info!("Connecting to PostgreSQL...");
            Some(database::connect(&config.database).await?)
        }
        VectorStoreBackend::InMemory => None,
    };

    let config_repository: Arc<dyn ProviderConfigRepository> = match &pool {
        Some(pool) => Arc::new(PostgresProviderConfigRepository::new(pool.clone())),
        None => Arc::new(InMemoryProviderConfigRepository::new()),
    };

    let store = create_vector_store(&config.vector_store, pool)?;

    let credentials: Arc<dyn CredentialSource> = Arc::new(EnvCredentialSource::new());
    let http = Arc::new(HttpClient::with_connect_timeout(PROVIDER_CONNECT_TIMEOUT)?);

    let providers = ProviderRegistry::new(http, credentials.clone(), config.providers.clone())
        .with_embedding_batch_size(config.rag.embedding_batch_size)
        .with_timeout(Duration::from_secs(config.rag.provider_timeout_secs));

    let rag_service = RagService::new(store, config_repository.clone(), providers, settings);
    let config_service = ConfigService::new(config_repository, credentials);

    for status in config_service.credential_status() {
        if !status.configured {
            info!(
                provider = %status.provider,
                credential = %status.credential,
                "Provider credential not set"
            );
        }
    }

    info!(
        top_k = settings.top_k,
        chunk_size = settings.chunking.chunk_size,
        chunk_overlap = settings.chunking.chunk_overlap,
        "Application state initialized"
    );

    Ok(AppState::new(rag_service, config_service))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_embedding_model_matches_column() {
        assert_eq!(embedding_dimension_mismatch(&AppConfig::default()), None);
    }

    #[test]
    fn test_embedding_dimension_mismatch() {
        let mut config = AppConfig::default();
        config.providers.openai_embedding_model = "text-embedding-3-large".to_string();
        assert_eq!(embedding_dimension_mismatch(&config), Some(3072));

        config.vector_store.dimensions = 3072;
        assert_eq!(embedding_dimension_mismatch(&config), None);

        config.providers.openai_embedding_model = "my-finetune".to_string();
        assert_eq!(embedding_dimension_mismatch(&config), None);
    }
}

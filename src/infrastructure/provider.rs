//! Provider selection and bounded outbound calls

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ProvidersConfig;
use crate::domain::provider_config::ProviderConfiguration;
use crate::domain::DomainError;

use super::credentials::CredentialSource;
use super::embedding::{select_embedding_backend, EmbeddingClient};
use super::http_client::HttpClientTrait;
use super::llm::{get_completion_model, CompletionModel};
use super::metrics;

/// Run one provider call under `timeout`, recording its latency and outcome
pub async fn bounded_call<T, F>(
    provider: &str,
    operation: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    let started = Instant::now();

    let result = match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(provider, operation, timeout_ms = timeout.as_millis() as u64, "Provider call timed out");
            Err(DomainError::timeout(provider, timeout.as_millis() as u64))
        }
    };

    let outcome = match &result {
        Ok(_) => "success",
        Err(DomainError::Timeout { .. }) => "timeout",
        Err(_) => "error",
    };
    metrics::record_provider_call(provider, operation, started.elapsed(), outcome);

    result
}

/// Builds embedding and completion handles for a configuration record
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    http: Arc<dyn HttpClientTrait>,
    credentials: Arc<dyn CredentialSource>,
    endpoints: ProvidersConfig,
    embedding_batch_size: usize,
    timeout: Duration,
}

impl ProviderRegistry {
    /// Create a registry with default batch size and timeout
    pub fn new(
        http: Arc<dyn HttpClientTrait>,
        credentials: Arc<dyn CredentialSource>,
        endpoints: ProvidersConfig,
    ) -> Self {
        Self {
            http,
            credentials,
            endpoints,
            embedding_batch_size: 100,
            timeout: Duration::from_secs(60),
        }
    }

    /// Set how many texts go into one embedding request
    pub fn with_embedding_batch_size(mut self, batch_size: usize) -> Self {
        self.embedding_batch_size = batch_size.max(1);
        self
    }

    /// Bound applied to every provider call made through handles from this registry
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialSource> {
        &self.credentials
    }

    /// Embedding client for the configured provider, falling back when its key is missing
    pub fn embeddings(&self, config: &ProviderConfiguration) -> Result<EmbeddingClient, DomainError> {
        let backend = select_embedding_backend(
            config.provider,
            self.credentials.as_ref(),
            &self.http,
            &self.endpoints,
        )?;

        Ok(EmbeddingClient::new(backend, self.embedding_batch_size, self.timeout))
    }

    /// Chat model for the configured provider
    pub fn completion_model(
        &self,
        config: &ProviderConfiguration,
    ) -> Result<CompletionModel, DomainError> {
        get_completion_model(
            config,
            self.credentials.as_ref(),
            &self.http,
            &self.endpoints,
            self.timeout,
        )
    }
}

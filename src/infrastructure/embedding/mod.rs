//! Embedding backends and backend selection

mod gemini;
mod openai;

pub use gemini::{GeminiEmbeddings, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_EMBEDDING_MODEL};
pub use openai::{OpenAiEmbeddings, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_EMBEDDING_MODEL};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::credentials::CredentialSource;
use super::http_client::HttpClientTrait;
use super::provider::bounded_call;
use crate::config::ProvidersConfig;
use crate::domain::embedding::TextEmbedder;
use crate::domain::provider_config::ProviderKind;
use crate::domain::DomainError;

/// Order in which backends are tried when the configured one is unavailable
const FALLBACK_ORDER: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Gemini];

/// Some backends embed documents and queries differently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingPurpose {
    Document,
    Query,
}

/// Concrete embedding backend
#[derive(Debug, Clone)]
pub enum EmbeddingBackend {
    OpenAi(OpenAiEmbeddings),
    Gemini(GeminiEmbeddings),
}

impl EmbeddingBackend {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Gemini(_) => ProviderKind::Gemini,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi(p) => p.model(),
            Self::Gemini(p) => p.model(),
        }
    }

    /// Embed one batch
    pub async fn embed(
        &self,
        texts: &[String],
        purpose: EmbeddingPurpose,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        match self {
            Self::OpenAi(p) => p.embed(texts).await,
            Self::Gemini(p) => p.embed(texts, purpose).await,
        }
    }
}

/// Pick the embedding backend for `configured`.
///
/// Uses the configured provider when its key is present, otherwise the first
/// backend in the fallback order that has one. Anthropic has no embeddings
/// API and always falls back.
pub fn select_embedding_backend(
    configured: ProviderKind,
    credentials: &dyn CredentialSource,
    http: &Arc<dyn HttpClientTrait>,
    endpoints: &ProvidersConfig,
) -> Result<EmbeddingBackend, DomainError> {
    let native = match configured {
        ProviderKind::OpenAi | ProviderKind::Gemini => Some(configured),
        ProviderKind::Anthropic => None,
    };

    let candidates = native.into_iter().chain(FALLBACK_ORDER);

    for kind in candidates {
        let Some(api_key) = credentials.api_key(kind) else {
            continue;
        };

        if kind != configured {
            tracing::debug!(
                configured = %configured,
                selected = %kind,
                "Falling back to another embedding backend"
            );
        }

        return Ok(build_backend(kind, api_key, http, endpoints));
    }

    Err(DomainError::configuration(format!(
        "No embedding credential available: set {} or {}",
        credentials.credential_name(ProviderKind::OpenAi),
        credentials.credential_name(ProviderKind::Gemini)
    )))
}

fn build_backend(
    kind: ProviderKind,
    api_key: String,
    http: &Arc<dyn HttpClientTrait>,
    endpoints: &ProvidersConfig,
) -> EmbeddingBackend {
    match kind {
        ProviderKind::Gemini => EmbeddingBackend::Gemini(GeminiEmbeddings::new(
            Arc::clone(http),
            api_key,
            &endpoints.gemini_base_url,
            &endpoints.gemini_embedding_model,
        )),
        ProviderKind::OpenAi | ProviderKind::Anthropic => {
            EmbeddingBackend::OpenAi(OpenAiEmbeddings::new(
                Arc::clone(http),
                api_key,
                &endpoints.openai_base_url,
                &endpoints.openai_embedding_model,
            ))
        }
    }
}

/// Batching, time-bounded embedder over a selected backend
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    backend: EmbeddingBackend,
    batch_size: usize,
    timeout: Duration,
}

impl EmbeddingClient {
    pub fn new(backend: EmbeddingBackend, batch_size: usize, timeout: Duration) -> Self {
        Self {
            backend,
            batch_size: batch_size.max(1),
            timeout,
        }
    }

    pub fn backend(&self) -> &EmbeddingBackend {
        &self.backend
    }
}

#[async_trait]
impl TextEmbedder for EmbeddingClient {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for (batch_index, batch) in texts.chunks(self.batch_size).enumerate() {
            let embedded = bounded_call(
                self.provider_name(),
                "embed",
                self.timeout,
                self.backend.embed(batch, EmbeddingPurpose::Document),
            )
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    provider = self.provider_name(),
                    batch = batch_index,
                    batch_len = batch.len(),
                    error = %e,
                    "Embedding batch failed"
                );
            })?;

            vectors.extend(embedded);
        }

        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let texts = [text.to_string()];
        let mut vectors = bounded_call(
            self.provider_name(),
            "embed_query",
            self.timeout,
            self.backend.embed(&texts, EmbeddingPurpose::Query),
        )
        .await?;

        vectors.pop().ok_or_else(|| {
            DomainError::provider(self.provider_name(), "Empty embedding response for query")
        })
    }

    fn provider_name(&self) -> &'static str {
        self.backend.kind().label()
    }
}

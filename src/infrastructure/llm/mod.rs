//! Completion backends and model selection

mod anthropic;
mod gemini;
mod openai;

pub use anthropic::{AnthropicChat, DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_ANTHROPIC_MODEL, DEFAULT_MAX_TOKENS};
pub use gemini::{GeminiChat, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use openai::{OpenAiChat, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};

use std::sync::Arc;
use std::time::Duration;

use super::credentials::CredentialSource;
use super::http_client::HttpClientTrait;
use super::provider::bounded_call;
use crate::config::ProvidersConfig;
use crate::domain::llm::{CompletionInput, GenerationParams};
use crate::domain::provider_config::{ProviderConfiguration, ProviderKind};
use crate::domain::DomainError;

/// Text produced by a completion call
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub finish_reason: Option<String>,
}

/// Concrete completion backend
#[derive(Debug, Clone)]
pub enum CompletionBackend {
    OpenAi(OpenAiChat),
    Gemini(GeminiChat),
    Anthropic(AnthropicChat),
}

impl CompletionBackend {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Gemini(_) => ProviderKind::Gemini,
            Self::Anthropic(_) => ProviderKind::Anthropic,
        }
    }

    pub async fn complete(
        &self,
        model: &str,
        input: &CompletionInput,
        params: &GenerationParams,
    ) -> Result<Completion, DomainError> {
        match self {
            Self::OpenAi(p) => p.complete(model, input, params).await,
            Self::Gemini(p) => p.complete(model, input, params).await,
            Self::Anthropic(p) => p.complete(model, input, params).await,
        }
    }
}

/// Default model for a provider when the configuration has no override
pub fn default_model(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::OpenAi => DEFAULT_OPENAI_MODEL,
        ProviderKind::Gemini => DEFAULT_GEMINI_MODEL,
        ProviderKind::Anthropic => DEFAULT_ANTHROPIC_MODEL,
    }
}

/// A ready-to-call completion handle: backend, model and parameters
#[derive(Debug, Clone)]
pub struct CompletionModel {
    backend: CompletionBackend,
    model: String,
    params: GenerationParams,
    timeout: Duration,
}

impl CompletionModel {
    pub fn new(
        backend: CompletionBackend,
        model: impl Into<String>,
        params: GenerationParams,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            params,
            timeout,
        }
    }

    pub fn provider(&self) -> ProviderKind {
        self.backend.kind()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// One bounded call to the backend
    pub async fn invoke(&self, input: &CompletionInput) -> Result<Completion, DomainError> {
        tracing::debug!(
            provider = self.provider().label(),
            model = %self.model,
            input = input.shape(),
            "Invoking completion model"
        );

        bounded_call(
            self.provider().label(),
            "complete",
            self.timeout,
            self.backend.complete(&self.model, input, &self.params),
        )
        .await
    }
}

/// Build the completion handle described by `config`.
///
/// Fails with a configuration error naming the credential when the selected
/// provider has no key.
pub fn get_completion_model(
    config: &ProviderConfiguration,
    credentials: &dyn CredentialSource,
    http: &Arc<dyn HttpClientTrait>,
    endpoints: &ProvidersConfig,
    timeout: Duration,
) -> Result<CompletionModel, DomainError> {
    let api_key = credentials.require(config.provider)?;
    let http = Arc::clone(http);

    let backend = match config.provider {
        ProviderKind::OpenAi => {
            CompletionBackend::OpenAi(OpenAiChat::new(http, api_key, &endpoints.openai_base_url))
        }
        ProviderKind::Gemini => {
            CompletionBackend::Gemini(GeminiChat::new(http, api_key, &endpoints.gemini_base_url))
        }
        ProviderKind::Anthropic => CompletionBackend::Anthropic(AnthropicChat::new(
            http,
            api_key,
            &endpoints.anthropic_base_url,
        )),
    };

    let model = config
        .model_override()
        .unwrap_or_else(|| default_model(config.provider));

    Ok(CompletionModel::new(
        backend,
        model,
        config.params.clone(),
        timeout,
    ))
}

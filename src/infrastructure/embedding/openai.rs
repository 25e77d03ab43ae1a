//! OpenAI embeddings backend

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Known OpenAI embedding models and their dimensions
const EMBEDDING_MODELS: &[(&str, usize)] = &[
    ("text-embedding-3-small", 1536),
    ("text-embedding-3-large", 3072),
    ("text-embedding-ada-002", 1536),
];

#[derive(Debug, Clone)]
pub struct OpenAiEmbeddings {
    client: Arc<dyn HttpClientTrait>,
    auth_header: String,
    base_url: String,
    model: String,
}

impl OpenAiEmbeddings {
    pub fn new(
        client: Arc<dyn HttpClientTrait>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Vector width produced by a known OpenAI embedding model
    pub fn known_dimensions(model: &str) -> Option<usize> {
        EMBEDDING_MODELS
            .iter()
            .find(|(name, _)| *name == model)
            .map(|(_, dims)| *dims)
    }

    pub(crate) fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post_json(&self.embeddings_url(), self.headers(), &body)
            .await?;

        parse_response(response, texts.len())
    }
}

fn parse_response(json: serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>, DomainError> {
    let mut response: OpenAiEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
        DomainError::provider("openai", format!("Failed to parse embedding response: {}", e))
    })?;

    if response.data.len() != expected {
        return Err(DomainError::provider(
            "openai",
            format!(
                "Expected {} embeddings, received {}",
                expected,
                response.data.len()
            ),
        ));
    }

    response.data.sort_by_key(|d| d.index);

    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

//! Gemini embeddings backend

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use super::EmbeddingPurpose;
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_EMBEDDING_MODEL: &str = "text-embedding-004";

#[derive(Debug, Clone)]
pub struct GeminiEmbeddings {
    client: Arc<dyn HttpClientTrait>,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiEmbeddings {
    pub fn new(
        client: Arc<dyn HttpClientTrait>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let model = model.trim_start_matches("models/").to_string();

        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn embeddings_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:batchEmbedContents",
            self.base_url, self.model
        )
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-goog-api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, texts: &[String], purpose: EmbeddingPurpose) -> serde_json::Value {
        let task_type = match purpose {
            EmbeddingPurpose::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingPurpose::Query => "RETRIEVAL_QUERY",
        };
        let model = format!("models/{}", self.model);

        let requests: Vec<serde_json::Value> = texts
            .iter()
            .map(|text| {
                json!({
                    "model": model,
                    "content": {"parts": [{"text": text}]},
                    "taskType": task_type,
                })
            })
            .collect();

        json!({ "requests": requests })
    }

    pub async fn embed(
        &self,
        texts: &[String],
        purpose: EmbeddingPurpose,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        let body = self.build_request(texts, purpose);

        let response = self
            .client
            .post_json(&self.embeddings_url(), self.headers(), &body)
            .await?;

        let response: GeminiBatchResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::provider("gemini", format!("Failed to parse embedding response: {}", e))
        })?;

        if response.embeddings.len() != texts.len() {
            return Err(DomainError::provider(
                "gemini",
                format!(
                    "Expected {} embeddings, received {}",
                    texts.len(),
                    response.embeddings.len()
                ),
            ));
        }

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiBatchResponse {
    #[serde(default)]
    embeddings: Vec<GeminiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::mock::MockHttpClient;

    const TEST_URL: &str =
        "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:batchEmbedContents";

    fn provider(client: Arc<MockHttpClient>) -> GeminiEmbeddings {
        GeminiEmbeddings::new(
            client,
            "g-key",
            DEFAULT_GEMINI_BASE_URL,
            "models/text-embedding-004",
        )
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let client = Arc::new(MockHttpClient::new().with_response(
            TEST_URL,
            json!({"embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]}),
        ));

        let vectors = provider(client.clone())
            .embed(&["a".to_string(), "b".to_string()], EmbeddingPurpose::Document)
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);

        let request = &client.requests_to(TEST_URL)[0];
        assert_eq!(request.header("x-goog-api-key"), Some("g-key"));
        assert_eq!(request.body["requests"][1]["content"]["parts"][0]["text"], "b");
        assert_eq!(request.body["requests"][0]["model"], "models/text-embedding-004");
        assert_eq!(request.body["requests"][0]["taskType"], "RETRIEVAL_DOCUMENT");
    }

    #[tokio::test]
    async fn test_query_task_type() {
        let client = Arc::new(
            MockHttpClient::new()
                .with_response(TEST_URL, json!({"embeddings": [{"values": [1.0]}]})),
        );

        provider(client.clone())
            .embed(&["q".to_string()], EmbeddingPurpose::Query)
            .await
            .unwrap();

        let request = &client.requests_to(TEST_URL)[0];
        assert_eq!(request.body["requests"][0]["taskType"], "RETRIEVAL_QUERY");
    }

    #[tokio::test]
    async fn test_missing_embeddings_is_provider_error() {
        let client = Arc::new(MockHttpClient::new().with_response(TEST_URL, json!({})));
        let result = provider(client)
            .embed(&["a".to_string()], EmbeddingPurpose::Document)
            .await;
        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }
}

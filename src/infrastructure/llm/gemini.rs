//! Gemini generateContent backend

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use super::Completion;
use crate::domain::llm::{CompletionInput, GenerationParams, Message, MessageRole};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

#[derive(Debug, Clone)]
pub struct GeminiChat {
    client: Arc<dyn HttpClientTrait>,
    api_key: String,
    base_url: String,
}

impl GeminiChat {
    pub fn new(
        client: Arc<dyn HttpClientTrait>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            model.trim_start_matches("models/")
        )
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-goog-api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    pub async fn complete(
        &self,
        model: &str,
        input: &CompletionInput,
        params: &GenerationParams,
    ) -> Result<Completion, DomainError> {
        let body = build_request(input, params);

        let response = self
            .client
            .post_json(&self.generate_url(model), self.headers(), &body)
            .await?;

        parse_response(response)
    }
}

/// generateContent body; `generationConfig` is omitted when nothing is set
pub(crate) fn build_request(input: &CompletionInput, params: &GenerationParams) -> serde_json::Value {
    let (system, contents) = match input {
        CompletionInput::Messages(messages) => to_contents(messages),
        CompletionInput::Prompt(prompt) => (
            None,
            vec![json!({"role": "user", "parts": [{"text": prompt}]})],
        ),
    };

    let mut body = json!({ "contents": contents });

    if let Some(system) = system {
        body["systemInstruction"] = json!({"parts": [{"text": system}]});
    }

    let mut generation = serde_json::Map::new();

    if let Some(temperature) = params.temperature {
        generation.insert("temperature".into(), json!(temperature));
    }

    if let Some(max_tokens) = params.max_tokens {
        generation.insert("maxOutputTokens".into(), json!(max_tokens));
    }

    if let Some(top_p) = params.top_p {
        generation.insert("topP".into(), json!(top_p));
    }

    if let Some(top_k) = params.top_k {
        generation.insert("topK".into(), json!(top_k));
    }

    if let Some(stop) = params.stop() {
        generation.insert("stopSequences".into(), json!(stop));
    }

    if !generation.is_empty() {
        body["generationConfig"] = serde_json::Value::Object(generation);
    }

    body
}

fn to_contents(messages: &[Message]) -> (Option<String>, Vec<serde_json::Value>) {
    let mut system = Vec::new();
    let mut contents = Vec::new();

    for message in messages {
        let role = match message.role {
            MessageRole::System => {
                system.push(message.content.as_str());
                continue;
            }
            MessageRole::User => "user",
            MessageRole::Assistant => "model",
        };

        contents.push(json!({"role": role, "parts": [{"text": message.content}]}));
    }

    let system = (!system.is_empty()).then(|| system.join("\n\n"));
    (system, contents)
}

fn parse_response(json: serde_json::Value) -> Result<Completion, DomainError> {
    let response: GeminiResponse = serde_json::from_value(json).map_err(|e| {
        DomainError::provider("gemini", format!("Failed to parse response: {}", e))
    })?;

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::provider("gemini", "No candidates in response"))?;

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    Ok(Completion {
        text,
        finish_reason: candidate.finish_reason,
    })
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

//! Anthropic messages backend

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use super::Completion;
use crate::domain::llm::{CompletionInput, GenerationParams, Message, MessageRole};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The messages API requires `max_tokens`; used when none is configured
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone)]
pub struct AnthropicChat {
    client: Arc<dyn HttpClientTrait>,
    api_key: String,
    base_url: String,
}

impl AnthropicChat {
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

    pub(crate) fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", ANTHROPIC_VERSION),
            ("Content-Type", "application/json"),
        ]
    }

    pub async fn complete(
        &self,
        model: &str,
        input: &CompletionInput,
        params: &GenerationParams,
    ) -> Result<Completion, DomainError> {
        let body = build_request(model, input, params);

        let response = self
            .client
            .post_json(&self.messages_url(), self.headers(), &body)
            .await?;

        parse_response(response)
    }
}

/// Messages body; penalties are unsupported and dropped
pub(crate) fn build_request(
    model: &str,
    input: &CompletionInput,
    params: &GenerationParams,
) -> serde_json::Value {
    let (system, messages) = match input {
        CompletionInput::Messages(messages) => split_system_messages(messages),
        CompletionInput::Prompt(prompt) => {
            (None, vec![json!({"role": "user", "content": prompt})])
        }
    };

    let mut body = json!({
        "model": model,
        "messages": messages,
        "max_tokens": params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
    });

    if let Some(system) = system {
        body["system"] = json!(system);
    }

    if let Some(temperature) = params.temperature {
        body["temperature"] = json!(temperature);
    }

    if let Some(top_p) = params.top_p {
        body["top_p"] = json!(top_p);
    }

    if let Some(top_k) = params.top_k {
        body["top_k"] = json!(top_k);
    }

    if let Some(stop) = params.stop() {
        body["stop_sequences"] = json!(stop);
    }

    body
}

fn split_system_messages(messages: &[Message]) -> (Option<String>, Vec<serde_json::Value>) {
    let mut system = Vec::new();
    let mut rest = Vec::new();

    for message in messages {
        match message.role {
            MessageRole::System => system.push(message.content.as_str()),
            MessageRole::User | MessageRole::Assistant => rest.push(json!({
                "role": message.role.as_str(),
                "content": message.content,
            })),
        }
    }

    let system = (!system.is_empty()).then(|| system.join("\n\n"));
    (system, rest)
}

fn parse_response(json: serde_json::Value) -> Result<Completion, DomainError> {
    let response: AnthropicResponse = serde_json::from_value(json).map_err(|e| {
        DomainError::provider("anthropic", format!("Failed to parse response: {}", e))
    })?;

    let text = response
        .content
        .into_iter()
        .filter(|block| block.content_type == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");

    Ok(Completion {
        text,
        finish_reason: response.stop_reason,
    })
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

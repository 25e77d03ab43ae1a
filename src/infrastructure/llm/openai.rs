//! OpenAI chat completions backend

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use super::Completion;
use crate::domain::llm::{CompletionInput, GenerationParams, Message};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: Arc<dyn HttpClientTrait>,
    auth_header: String,
    base_url: String,
}

impl OpenAiChat {
    pub fn new(
        client: Arc<dyn HttpClientTrait>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn chat_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
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
            .post_json(&self.chat_url(), self.headers(), &body)
            .await?;

        parse_response(response)
    }
}

/// Chat completions body; unsupported `top_k` is dropped
pub(crate) fn build_request(
    model: &str,
    input: &CompletionInput,
    params: &GenerationParams,
) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = match input {
        CompletionInput::Messages(messages) => messages.iter().map(to_openai_message).collect(),
        CompletionInput::Prompt(prompt) => vec![json!({"role": "user", "content": prompt})],
    };

    let mut body = json!({
        "model": model,
        "messages": messages,
    });

    if let Some(temperature) = params.temperature {
        body["temperature"] = json!(temperature);
    }

    if let Some(max_tokens) = params.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }

    if let Some(top_p) = params.top_p {
        body["top_p"] = json!(top_p);
    }

    if let Some(frequency_penalty) = params.frequency_penalty {
        body["frequency_penalty"] = json!(frequency_penalty);
    }

    if let Some(presence_penalty) = params.presence_penalty {
        body["presence_penalty"] = json!(presence_penalty);
    }

    if let Some(stop) = params.stop() {
        body["stop"] = json!(stop);
    }

    body
}

fn to_openai_message(message: &Message) -> serde_json::Value {
    json!({
        "role": message.role.as_str(),
        "content": message.content,
    })
}

fn parse_response(json: serde_json::Value) -> Result<Completion, DomainError> {
    let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
        DomainError::provider("openai", format!("Failed to parse response: {}", e))
    })?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::provider("openai", "No choices in response"))?;

    Ok(Completion {
        text: choice.message.content.unwrap_or_default(),
        finish_reason: choice.finish_reason,
    })
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

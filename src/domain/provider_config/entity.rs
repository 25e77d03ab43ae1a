//! Global provider configuration record

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::llm::GenerationParams;
use crate::domain::DomainError;

/// Key of the single global configuration record
pub const DEFAULT_CONFIG_KEY: &str = "default";

/// The closed set of supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Anthropic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::OpenAi, Self::Gemini, Self::Anthropic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI",
            Self::Gemini => "GEMINI",
            Self::Anthropic => "ANTHROPIC",
        }
    }

    /// Lowercase name used in logs and metric labels
    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPENAI" => Ok(Self::OpenAi),
            "GEMINI" => Ok(Self::Gemini),
            "ANTHROPIC" => Ok(Self::Anthropic),
            other => Err(DomainError::configuration(format!(
                "Unknown provider '{}': expected OPENAI, GEMINI or ANTHROPIC",
                other
            ))),
        }
    }
}

/// Which provider to use and with which generation parameters.
///
/// Loaded once per ingestion or query call and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfiguration {
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub params: GenerationParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProviderConfiguration {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            model: None,
            params: GenerationParams::default(),
            updated_at: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Model override, ignoring blank strings
    pub fn model_override(&self) -> Option<&str> {
        self.model.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }

    pub fn apply(&mut self, update: ProviderConfigUpdate) {
        if let Some(provider) = update.provider {
            self.provider = provider;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(temperature) = update.temperature {
            self.params.temperature = temperature;
        }
        if let Some(max_tokens) = update.max_tokens {
            self.params.max_tokens = max_tokens;
        }
        if let Some(top_p) = update.top_p {
            self.params.top_p = top_p;
        }
        if let Some(top_k) = update.top_k {
            self.params.top_k = top_k;
        }
        if let Some(frequency_penalty) = update.frequency_penalty {
            self.params.frequency_penalty = frequency_penalty;
        }
        if let Some(presence_penalty) = update.presence_penalty {
            self.params.presence_penalty = presence_penalty;
        }
        if let Some(stop_sequences) = update.stop_sequences {
            self.params.stop_sequences = stop_sequences;
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(t) = self.params.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(DomainError::validation(format!(
                    "temperature must be between 0 and 2, got {}",
                    t
                )));
            }
        }

        if let Some(p) = self.params.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(DomainError::validation(format!(
                    "top_p must be between 0 and 1, got {}",
                    p
                )));
            }
        }

        if self.params.max_tokens == Some(0) {
            return Err(DomainError::validation("max_tokens must be greater than 0"));
        }

        if self.params.top_k == Some(0) {
            return Err(DomainError::validation("top_k must be greater than 0"));
        }

        for (name, value) in [
            ("frequency_penalty", self.params.frequency_penalty),
            ("presence_penalty", self.params.presence_penalty),
        ] {
            if let Some(v) = value {
                if !(-2.0..=2.0).contains(&v) {
                    return Err(DomainError::validation(format!(
                        "{} must be between -2 and 2, got {}",
                        name, v
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for ProviderConfiguration {
    /// Built-in defaults written on first read
    fn default() -> Self {
        Self::new(ProviderKind::OpenAi)
            .with_model("gpt-4o")
            .with_params(GenerationParams {
                temperature: Some(0.1),
                max_tokens: Some(1200),
                top_p: Some(1.0),
                top_k: None,
                frequency_penalty: Some(0.0),
                presence_penalty: Some(0.0),
                stop_sequences: None,
            })
    }
}

/// Administrative partial update.
///
/// A missing field leaves the value untouched; an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfigUpdate {
    #[serde(default)]
    pub provider: Option<ProviderKind>,
    #[serde(default, deserialize_with = "present")]
    pub model: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub temperature: Option<Option<f32>>,
    #[serde(default, deserialize_with = "present")]
    pub max_tokens: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present")]
    pub top_p: Option<Option<f32>>,
    #[serde(default, deserialize_with = "present")]
    pub top_k: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present")]
    pub frequency_penalty: Option<Option<f32>>,
    #[serde(default, deserialize_with = "present")]
    pub presence_penalty: Option<Option<f32>>,
    #[serde(default, deserialize_with = "present")]
    pub stop_sequences: Option<Option<Vec<String>>>,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

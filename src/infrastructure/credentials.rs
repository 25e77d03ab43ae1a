//! Provider API credentials

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;

use crate::domain::provider_config::ProviderKind;
use crate::domain::DomainError;

/// Default environment variable holding each provider's API key
pub fn default_env_var(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::OpenAi => "OPENAI_API_KEY",
        ProviderKind::Gemini => "GEMINI_API_KEY",
        ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
    }
}

/// Where provider API keys come from
pub trait CredentialSource: Send + Sync + Debug {
    /// The key for `provider`, or `None` when it is not configured
    fn api_key(&self, provider: ProviderKind) -> Option<String>;

    /// Name shown to operators when the key is missing
    fn credential_name(&self, provider: ProviderKind) -> String {
        default_env_var(provider).to_string()
    }

    fn has_key(&self, provider: ProviderKind) -> bool {
        self.api_key(provider).is_some()
    }

    /// The key, or a configuration error naming the missing credential
    fn require(&self, provider: ProviderKind) -> Result<String, DomainError> {
        self.api_key(provider).ok_or_else(|| {
            DomainError::configuration(format!(
                "{} is not set; configure it to use the {} provider",
                self.credential_name(provider),
                provider
            ))
        })
    }
}

/// Reads API keys from environment variables on every lookup
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    mappings: HashMap<ProviderKind, String>,
}

impl EnvCredentialSource {
    /// Read each provider's key from its default environment variable
    pub fn new() -> Self {
        let mappings = ProviderKind::ALL
            .iter()
            .map(|p| (*p, default_env_var(*p).to_string()))
            .collect();

        Self { mappings }
    }

    /// Read `provider`'s key from a different variable
    pub fn with_mapping(mut self, provider: ProviderKind, env_var: impl Into<String>) -> Self {
        self.mappings.insert(provider, env_var.into());
        self
    }
}

impl Default for EnvCredentialSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialSource for EnvCredentialSource {
    fn api_key(&self, provider: ProviderKind) -> Option<String> {
        let var = self.mappings.get(&provider)?;
        env::var(var).ok().filter(|v| !v.trim().is_empty())
    }

    fn credential_name(&self, provider: ProviderKind) -> String {
        self.mappings
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| default_env_var(provider).to_string())
    }
}

/// Fixed set of keys, for tests and embedded use
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialSource {
    keys: HashMap<ProviderKind, String>,
}

impl StaticCredentialSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key for `provider`
    pub fn with_key(mut self, provider: ProviderKind, key: impl Into<String>) -> Self {
        self.keys.insert(provider, key.into());
        self
    }
}

impl CredentialSource for StaticCredentialSource {
    fn api_key(&self, provider: ProviderKind) -> Option<String> {
        self.keys
            .get(&provider)
            .filter(|k| !k.trim().is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_source_reads_mapped_variable() {
        unsafe {
            env::set_var("KRAG_TEST_GEMINI_KEY", "g-key");
        }

        let source =
            EnvCredentialSource::new().with_mapping(ProviderKind::Gemini, "KRAG_TEST_GEMINI_KEY");

        assert_eq!(source.api_key(ProviderKind::Gemini), Some("g-key".to_string()));
        assert_eq!(source.credential_name(ProviderKind::Gemini), "KRAG_TEST_GEMINI_KEY");

        unsafe {
            env::remove_var("KRAG_TEST_GEMINI_KEY");
        }
    }

    #[test]
    fn test_env_source_blank_value_is_missing() {
        unsafe {
            env::set_var("KRAG_TEST_BLANK_KEY", "   ");
        }

        let source =
            EnvCredentialSource::new().with_mapping(ProviderKind::OpenAi, "KRAG_TEST_BLANK_KEY");
        assert!(!source.has_key(ProviderKind::OpenAi));

        unsafe {
            env::remove_var("KRAG_TEST_BLANK_KEY");
        }
    }

    #[test]
    fn test_require_names_missing_credential() {
        let source = StaticCredentialSource::new().with_key(ProviderKind::OpenAi, "sk-test");

        assert_eq!(source.require(ProviderKind::OpenAi).unwrap(), "sk-test");

        let err = source.require(ProviderKind::Anthropic).unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_default_env_vars() {
        assert_eq!(default_env_var(ProviderKind::OpenAi), "OPENAI_API_KEY");
        assert_eq!(default_env_var(ProviderKind::Gemini), "GEMINI_API_KEY");
        assert_eq!(default_env_var(ProviderKind::Anthropic), "ANTHROPIC_API_KEY");
    }
}

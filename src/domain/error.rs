use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Empty document: {message}")]
    EmptyDocument { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Provider timeout: {provider} did not respond within {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn empty_document(message: impl Into<String>) -> Self {
        Self::EmptyDocument {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            provider: provider.into(),
            timeout_ms,
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the whole call may succeed without operator action
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. } | Self::Timeout { .. } | Self::Storage { .. }
        )
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_error() {
        let error = DomainError::empty_document("report.pdf produced no text");
        assert_eq!(error.to_string(), "Empty document: report.pdf produced no text");
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_configuration_error() {
        let error = DomainError::configuration("OPENAI_API_KEY is not set");
        assert_eq!(
            error.to_string(),
            "Configuration error: OPENAI_API_KEY is not set"
        );
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_timeout_is_retryable() {
        let error = DomainError::timeout("openai", 1500);
        assert_eq!(
            error.to_string(),
            "Provider timeout: openai did not respond within 1500ms"
        );
        assert!(error.is_retryable());
    }

    #[test]
    fn test_provider_and_storage_are_retryable() {
        assert!(DomainError::provider("gemini", "HTTP 429").is_retryable());
        assert!(DomainError::storage("pool timed out").is_retryable());
        assert!(!DomainError::validation("empty question").is_retryable());
    }
}

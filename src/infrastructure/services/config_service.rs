//! Configuration service - Manages the global provider configuration

use std::sync::Arc;

use crate::domain::provider_config::{
    ProviderConfigRepository, ProviderConfigUpdate, ProviderConfiguration, ProviderKind,
};
use crate::domain::DomainError;
use crate::infrastructure::credentials::CredentialSource;

/// Whether a provider's credential is configured, without exposing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStatus {
    pub provider: ProviderKind,
    pub credential: String,
    pub configured: bool,
}

/// Reads and updates the provider configuration record
pub struct ConfigService {
    repository: Arc<dyn ProviderConfigRepository>,
    credentials: Arc<dyn CredentialSource>,
}

impl ConfigService {
    /// Create a new configuration service
    pub fn new(
        repository: Arc<dyn ProviderConfigRepository>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            repository,
            credentials,
        }
    }

    /// Get the current configuration, creating the defaults on first read
    pub async fn get(&self) -> Result<ProviderConfiguration, DomainError> {
        self.repository.load().await
    }

    /// Apply a partial update and persist the result
    pub async fn update(
        &self,
        update: ProviderConfigUpdate,
    ) -> Result<ProviderConfiguration, DomainError> {
        let mut config = self.repository.load().await?;
        config.apply(update);
        config.validate()?;

        if !self.credentials.has_key(config.provider) {
            tracing::warn!(
                provider = %config.provider,
                credential = %self.credentials.credential_name(config.provider),
                "Selected provider has no credential configured"
            );
        }

        self.repository.save(config).await
    }

    /// Restore the built-in defaults
    pub async fn reset(&self) -> Result<ProviderConfiguration, DomainError> {
        self.repository.save(ProviderConfiguration::default()).await
    }

    pub fn credential_status(&self) -> Vec<CredentialStatus> {
        ProviderKind::ALL
            .iter()
            .map(|provider| CredentialStatus {
                provider: *provider,
                credential: self.credentials.credential_name(*provider),
                configured: self.credentials.has_key(*provider),
            })
            .collect()
    }
}

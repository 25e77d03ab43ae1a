//! Provider configuration repository trait

use async_trait::async_trait;

use super::ProviderConfiguration;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Store for the single global provider configuration record
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProviderConfigRepository: Send + Sync {
    /// Read the record, creating it with built-in defaults when absent
    async fn load(&self) -> Result<ProviderConfiguration, DomainError>;

    /// Replace the record, returning it as stored
    async fn save(
        &self,
        config: ProviderConfiguration,
    ) -> Result<ProviderConfiguration, DomainError>;

    async fn health_check(&self) -> Result<bool, DomainError>;
}

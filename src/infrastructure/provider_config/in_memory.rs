//! In-process provider configuration

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::provider_config::{ProviderConfigRepository, ProviderConfiguration};
use crate::domain::DomainError;

/// Holds the configuration record in memory, seeded with the built-in defaults
#[derive(Debug)]
pub struct InMemoryProviderConfigRepository {
    record: RwLock<ProviderConfiguration>,
}

impl InMemoryProviderConfigRepository {
    pub fn new() -> Self {
        Self::with_config(ProviderConfiguration::default())
    }

    pub fn with_config(config: ProviderConfiguration) -> Self {
        Self {
            record: RwLock::new(config),
        }
    }
}

impl Default for InMemoryProviderConfigRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderConfigRepository for InMemoryProviderConfigRepository {
    async fn load(&self) -> Result<ProviderConfiguration, DomainError> {
        Ok(self.record.read().await.clone())
    }

    async fn save(
        &self,
        mut config: ProviderConfiguration,
    ) -> Result<ProviderConfiguration, DomainError> {
        config.validate()?;
        config.updated_at = Some(Utc::now());

        *self.record.write().await = config.clone();

        Ok(config)
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        Ok(true)
    }
}

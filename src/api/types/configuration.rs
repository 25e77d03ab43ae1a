//! Provider configuration response bodies

use serde::Serialize;

use crate::domain::provider_config::{ProviderConfiguration, ProviderKind};
use crate::infrastructure::services::CredentialStatus;

#[derive(Debug, Clone, Serialize)]
pub struct CredentialStatusView {
    pub provider: ProviderKind,
    pub credential: String,
    pub configured: bool,
}

impl From<CredentialStatus> for CredentialStatusView {
    fn from(status: CredentialStatus) -> Self {
        Self {
            provider: status.provider,
            credential: status.credential,
            configured: status.configured,
        }
    }
}

/// The stored record plus which provider credentials are present
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationResponse {
    pub configuration: ProviderConfiguration,
    pub credentials: Vec<CredentialStatusView>,
}

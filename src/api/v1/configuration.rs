//! Provider configuration endpoint handlers

use axum::extract::State;

use crate::api::state::AppState;
use crate::api::types::{ApiError, ConfigurationResponse, Json};
use crate::domain::provider_config::{ProviderConfigUpdate, ProviderConfiguration};

fn respond(state: &AppState, configuration: ProviderConfiguration) -> Json<ConfigurationResponse> {
    Json(ConfigurationResponse {
        configuration,
        credentials: state
            .config_service
            .credential_status()
            .into_iter()
            .map(Into::into)
            .collect(),
    })
}

/// GET /v1/configuration
pub async fn get_configuration(
    State(state): State<AppState>,
) -> Result<Json<ConfigurationResponse>, ApiError> {
    let configuration = state.config_service.get().await?;
    Ok(respond(&state, configuration))
}

/// PUT /v1/configuration
pub async fn update_configuration(
    State(state): State<AppState>,
    Json(update): Json<ProviderConfigUpdate>,
) -> Result<Json<ConfigurationResponse>, ApiError> {
    let configuration = state.config_service.update(update).await?;
    Ok(respond(&state, configuration))
}

/// DELETE /v1/configuration
///
/// Restores the built-in defaults.
pub async fn reset_configuration(
    State(state): State<AppState>,
) -> Result<Json<ConfigurationResponse>, ApiError> {
    let configuration = state.config_service.reset().await?;
    Ok(respond(&state, configuration))
}

//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::services::{ConfigService, RagService};

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub rag_service: Arc<RagService>,
    pub config_service: Arc<ConfigService>,
}

impl AppState {
    pub fn new(rag_service: RagService, config_service: ConfigService) -> Self {
        Self {
            rag_service: Arc::new(rag_service),
            config_service: Arc::new(config_service),
        }
    }
}

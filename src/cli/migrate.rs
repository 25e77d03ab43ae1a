//! Migrate command - creates the schema and exits

use tracing::{info, warn};

use crate::config::VectorStoreBackend;

/// Create the vector table and indexes, and seed the configuration record
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    if config.vector_store.backend == VectorStoreBackend::InMemory {
        warn!("The in-memory backend has no schema; nothing to migrate");
        return Ok(());
    }

    let state = crate::create_app_state_with_config(&config).await?;

    state.rag_service.store().ensure_schema().await?;
    info!(
        table = %config.vector_store.table_name,
        dimensions = config.vector_store.dimensions,
        "Vector schema ready"
    );

    // first load creates the table and writes the default record
    let configuration = state.rag_service.config_repository().load().await?;
    info!(provider = %configuration.provider, "Provider configuration ready");

    Ok(())
}

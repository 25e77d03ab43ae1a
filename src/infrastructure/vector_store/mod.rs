//! Vector store backends

mod in_memory;
mod pgvector;

pub use in_memory::InMemoryVectorStore;
pub use pgvector::{
    ef_search_for, to_pgvector_literal, PgvectorConfig, PgvectorStore, DEFAULT_DIMENSIONS,
    DEFAULT_TABLE_NAME, MAX_INDEXED_DIMENSIONS,
};

use std::sync::Arc;

use sqlx::postgres::PgPool;

use crate::config::{VectorStoreBackend, VectorStoreConfig};
use crate::domain::knowledge_base::VectorStore;
use crate::domain::DomainError;

/// Build the configured vector store.
///
/// The pgvector backend needs a pool; the in-memory backend ignores it.
pub fn create_vector_store(
    config: &VectorStoreConfig,
    pool: Option<PgPool>,
) -> Result<Arc<dyn VectorStore>, DomainError> {
    match config.backend {
        VectorStoreBackend::Pgvector => {
            let pool = pool.ok_or_else(|| {
                DomainError::configuration("The pgvector backend requires a database connection")
            })?;
            let store_config =
                PgvectorConfig::new(config.dimensions).with_table_name(&config.table_name);

            Ok(Arc::new(PgvectorStore::new(pool, store_config)?))
        }
        VectorStoreBackend::InMemory => {
            tracing::warn!("Using the in-memory vector store; indexed chunks are lost on restart");
            Ok(Arc::new(InMemoryVectorStore::with_dimensions(config.dimensions)))
        }
    }
}

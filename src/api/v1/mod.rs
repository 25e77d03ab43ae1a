//! v1 API endpoints

pub mod configuration;
pub mod knowledge_bases;

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/knowledge-bases/{kb_id}",
            delete(knowledge_bases::delete_knowledge_base),
        )
        .route(
            "/knowledge-bases/{kb_id}/documents",
            post(knowledge_bases::ingest_documents),
        )
        .route(
            "/knowledge-bases/{kb_id}/documents/{document_id}",
            delete(knowledge_bases::delete_document),
        )
        .route("/knowledge-bases/{kb_id}/query", post(knowledge_bases::query))
        .route(
            "/configuration",
            get(configuration::get_configuration)
                .put(configuration::update_configuration)
                .delete(configuration::reset_configuration),
        )
}

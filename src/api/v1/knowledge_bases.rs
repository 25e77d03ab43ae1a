//! Knowledge base endpoint handlers

use std::borrow::Cow;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, DeletedResponse, IngestDocumentsRequest, Json, QueryBody, MAX_TIMEOUT_MS,
};
use crate::domain::ingestion::BatchIngestionResult;
use crate::domain::knowledge_base::KnowledgeBaseId;
use crate::domain::rag::RagAnswer;
use crate::domain::DomainError;
use crate::infrastructure::services::RagService;

fn parse_kb_id(kb_id: String) -> Result<KnowledgeBaseId, ApiError> {
    KnowledgeBaseId::new(kb_id)
        .map_err(|e| ApiError::from(DomainError::from(e)).with_param("kb_id"))
}

/// The shared service, or a copy whose provider calls are bounded by `timeout_ms`
fn scoped_service(
    state: &AppState,
    timeout_ms: Option<u64>,
) -> Result<Cow<'_, RagService>, ApiError> {
    match timeout_ms {
        None => Ok(Cow::Borrowed(state.rag_service.as_ref())),
        Some(timeout_ms) if (1..=MAX_TIMEOUT_MS).contains(&timeout_ms) => Ok(Cow::Owned(
            state
                .rag_service
                .with_provider_timeout(Duration::from_millis(timeout_ms)),
        )),
        Some(_) => Err(ApiError::bad_request(format!(
            "timeout_ms must be between 1 and {}",
            MAX_TIMEOUT_MS
        ))
        .with_param("timeout_ms")),
    }
}

/// POST /v1/knowledge-bases/{kb_id}/documents
///
/// 200 when at least one document was ingested, 422 when all failed.
pub async fn ingest_documents(
    State(state): State<AppState>,
    Path(kb_id): Path<String>,
    Json(request): Json<IngestDocumentsRequest>,
) -> Result<(StatusCode, Json<BatchIngestionResult>), ApiError> {
    let kb_id = parse_kb_id(kb_id)?;

    if request.documents.is_empty() {
        return Err(ApiError::bad_request("At least one document is required").with_param("documents"));
    }

    debug!(kb_id = kb_id.as_str(), documents = request.documents.len(), "Ingesting documents");

    let service = scoped_service(&state, request.timeout_ms)?;
    let result = service.ingest_documents(&kb_id, request.documents).await;

    let status = if result.succeeded() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };

    Ok((status, Json(result)))
}

/// POST /v1/knowledge-bases/{kb_id}/query
pub async fn query(
    State(state): State<AppState>,
    Path(kb_id): Path<String>,
    Json(body): Json<QueryBody>,
) -> Result<Json<RagAnswer>, ApiError> {
    let kb_id = parse_kb_id(kb_id)?;

    debug!(kb_id = kb_id.as_str(), history = body.history.len(), "Querying knowledge base");

    let service = scoped_service(&state, body.timeout_ms)?;
    let answer = service.query(&kb_id, body.into_request()).await?;

    Ok(Json(answer))
}

/// DELETE /v1/knowledge-bases/{kb_id}
pub async fn delete_knowledge_base(
    State(state): State<AppState>,
    Path(kb_id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let kb_id = parse_kb_id(kb_id)?;
    let deleted = state.rag_service.delete_knowledge_base(&kb_id).await?;

    Ok(Json(DeletedResponse { deleted }))
}

/// DELETE /v1/knowledge-bases/{kb_id}/documents/{document_id}
pub async fn delete_document(
    State(state): State<AppState>,
    Path((kb_id, document_id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let kb_id = parse_kb_id(kb_id)?;
    let deleted = state
        .rag_service
        .delete_document(&kb_id, &document_id)
        .await?;

    Ok(Json(DeletedResponse { deleted }))
}

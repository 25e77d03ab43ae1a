use axum::{routing::get, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::health;
use super::state::AppState;
use super::v1;
use crate::infrastructure::metrics::{create_metrics_router, PrometheusMetrics};

/// Create the full router with application state
pub fn create_router_with_state(state: AppState, metrics: Option<PrometheusMetrics>) -> Router {
    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .with_state(state);

    if let Some(metrics) = metrics {
        router = router.merge(create_metrics_router(metrics));
    }

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::ProvidersConfig;
    use crate::domain::provider_config::ProviderKind;
    use crate::domain::rag::NO_DOCUMENTS_MESSAGE;
    use crate::infrastructure::credentials::StaticCredentialSource;
    use crate::infrastructure::http_client::mock::MockHttpClient;
    use crate::infrastructure::provider::ProviderRegistry;
    use crate::infrastructure::provider_config::InMemoryProviderConfigRepository;
    use crate::infrastructure::services::{ConfigService, RagService, RagSettings};
    use crate::infrastructure::vector_store::InMemoryVectorStore;

    const EMBED_URL: &str = "https://api.openai.com/v1/embeddings";

    fn embeddings(body: &Value) -> Result<Value, crate::domain::DomainError> {
        let count = body["input"].as_array().map(|a| a.len()).unwrap_or(0);
        let data: Vec<Value> = (0..count)
            .map(|i| json!({"index": i, "embedding": [1.0, 0.0, 0.0]}))
            .collect();
        Ok(json!({ "data": data }))
    }

    fn app() -> Router {
        app_with(MockHttpClient::new().with_handler(EMBED_URL, embeddings))
    }

    fn app_with(http: MockHttpClient) -> Router {
        let http = Arc::new(http);
        let credentials =
            Arc::new(StaticCredentialSource::new().with_key(ProviderKind::OpenAi, "sk-test"));
        let repository = Arc::new(InMemoryProviderConfigRepository::new());

        let rag_service = RagService::new(
            Arc::new(InMemoryVectorStore::new()),
            repository.clone(),
            ProviderRegistry::new(http, credentials.clone(), ProvidersConfig::default()),
            RagSettings::default(),
        );
        let config_service = ConfigService::new(repository, credentials);

        create_router_with_state(AppState::new(rag_service, config_service), None)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_sets_request_id() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_ready_with_in_memory_backends() {
        let response = app()
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_kb_id_is_bad_request() {
        let response = app()
            .oneshot(post_json(
                "/v1/knowledge-bases/bad%20id/query",
                r#"{"question": "What colour is the sky?"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["param"], "kb_id");
    }

    #[tokio::test]
    async fn test_query_on_empty_knowledge_base() {
        let response = app()
            .oneshot(post_json(
                "/v1/knowledge-bases/kb-empty/query",
                r#"{"question": "What colour is the sky?"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], NO_DOCUMENTS_MESSAGE);
        assert_eq!(body["sources"], json!([]));
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_envelope() {
        let response = app()
            .oneshot(post_json("/v1/knowledge-bases/kb-1/query", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "invalid_request_error");
        assert_eq!(body["error"]["code"], "json_parse_error");
    }

    #[tokio::test]
    async fn test_timeout_out_of_range_is_rejected() {
        let response = app()
            .oneshot(post_json(
                "/v1/knowledge-bases/kb-1/query",
                r#"{"question": "q", "timeout_ms": 0}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ingest_timeout_out_of_range_is_rejected() {
        let response = app()
            .oneshot(post_json(
                "/v1/knowledge-bases/kb-1/documents",
                r#"{"documents": [{"text": "The sky is blue."}], "timeout_ms": 300001}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["param"], "timeout_ms");
    }

    #[tokio::test]
    async fn test_ingest_honours_caller_timeout() {
        let slow = MockHttpClient::new()
            .with_handler(EMBED_URL, embeddings)
            .with_delay(std::time::Duration::from_millis(500));

        let response = app_with(slow)
            .oneshot(post_json(
                "/v1/knowledge-bases/kb-1/documents",
                r#"{"documents": [{"text": "The sky is blue."}], "timeout_ms": 20}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["failed"], 1);
        assert_eq!(body["results"][0]["error"]["kind"], "timeout");
        assert_eq!(body["results"][0]["error"]["retryable"], true);
    }

    #[tokio::test]
    async fn test_empty_document_list_is_rejected() {
        let response = app()
            .oneshot(post_json("/v1/knowledge-bases/kb-1/documents", r#"{"documents": []}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ingest_then_delete_document() {
        let app = app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/knowledge-bases/kb-1/documents",
                r#"{"documents": [{"text": "The sky is blue.", "metadata": {"documentId": "doc-1"}}]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["successful"], 1);

        let response = app
            .oneshot(
                Request::delete("/v1/knowledge-bases/kb-1/documents/doc-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["deleted"], 1);
    }

    #[tokio::test]
    async fn test_configuration_round_trip() {
        let app = app();

        let response = app
            .clone()
            .oneshot(Request::get("/v1/configuration").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["configuration"]["provider"], "OPENAI");

        let response = app
            .oneshot(
                Request::put("/v1/configuration")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"temperature": 5.0}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_configuration_reset_restores_defaults() {
        let app = app();

        let response = app
            .clone()
            .oneshot(
                Request::put("/v1/configuration")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"provider": "GEMINI", "max_tokens": 256}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["configuration"]["provider"], "GEMINI");

        let response = app
            .oneshot(Request::delete("/v1/configuration").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["configuration"]["provider"], "OPENAI");
    }
}

//! Prometheus metrics

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Prometheus metrics handle for serving the metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the global recorder; returns `None` when disabled or already installed
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("knowledge_rag_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics initialized at /metrics");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

pub fn create_metrics_router(metrics: PrometheusMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record one outbound embedding or completion call
pub fn record_provider_call(provider: &str, operation: &'static str, duration: Duration, outcome: &'static str) {
    let labels = [
        ("provider", provider.to_string()),
        ("operation", operation.to_string()),
        ("outcome", outcome.to_string()),
    ];

    counter!("rag_provider_requests_total", &labels).increment(1);
    histogram!("rag_provider_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

pub fn record_ingestion(chunks: usize) {
    counter!("rag_documents_ingested_total").increment(1);
    counter!("rag_chunks_ingested_total").increment(chunks as u64);
}

pub fn record_ingestion_failure(kind: &str) {
    counter!("rag_ingestion_failures_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_query(outcome: &'static str) {
    counter!("rag_queries_total", "outcome" => outcome).increment(1);
}

pub fn record_completion_fallback(provider: &str) {
    counter!("rag_completion_fallbacks_total", "provider" => provider.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_metrics_returns_none() {
        let config = MetricsConfig { enabled: false };
        assert!(init_metrics(&config).is_none());
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_provider_call("openai", "embed", Duration::from_millis(5), "success");
        record_ingestion(3);
        record_ingestion_failure("empty_document");
        record_query("answered");
        record_completion_fallback("gemini");
    }
}

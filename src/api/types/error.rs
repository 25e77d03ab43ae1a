//! Error envelope returned by every endpoint

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Error categories, in the OpenAI error-envelope style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    NotFoundError,
    UnprocessableDocumentError,
    ProviderError,
    TimeoutError,
    ServerError,
    ServiceUnavailableError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::UnprocessableDocumentError => write!(f, "unprocessable_document_error"),
            Self::ProviderError => write!(f, "provider_error"),
            Self::TimeoutError => write!(f, "timeout_error"),
            Self::ServerError => write!(f, "server_error"),
            Self::ServiceUnavailableError => write!(f, "service_unavailable_error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Set when repeating the same request may succeed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    /// Create an error with an explicit status and type
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    param: None,
                    code: None,
                    retryable: false,
                },
            },
        }
    }

    /// Name the request field that caused the error
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.response.error.param = Some(param.into());
        self
    }

    /// Attach a machine-readable error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    /// Mark the error as worth retrying
    pub fn retryable(mut self) -> Self {
        self.response.error.retryable = true;
        self
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    /// 422 for documents that could not be ingested
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorType::UnprocessableDocumentError,
            message,
        )
    }

    /// 502 for upstream provider failures
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, ApiErrorType::ProviderError, message)
    }

    /// 504 when a provider call exceeded its bound
    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, ApiErrorType::TimeoutError, message)
    }

    /// 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }

    /// 503 Service Unavailable
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorType::ServiceUnavailableError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

/// Precise messages for caller and operator mistakes; provider and store
/// failures are logged in full and answered generically.
impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::Validation { message } => Self::bad_request(message),
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::EmptyDocument { message } => {
                Self::unprocessable(message).with_code("empty_document")
            }
            DomainError::Configuration { message } => {
                Self::unavailable(message).with_code("configuration_error")
            }
            DomainError::Provider { provider, .. } => {
                tracing::error!(provider = %provider, error = %err, "Provider request failed");
                Self::bad_gateway(format!("The {} provider request failed", provider)).retryable()
            }
            DomainError::Timeout { provider, timeout_ms } => Self::gateway_timeout(format!(
                "The {} provider did not respond within {}ms",
                provider, timeout_ms
            ))
            .retryable(),
            DomainError::Storage { .. } => {
                tracing::error!(error = %err, "Storage failure");
                Self::internal("A storage error occurred").retryable()
            }
            DomainError::Internal { .. } => {
                tracing::error!(error = %err, "Internal error");
                Self::internal("An internal error occurred")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_with_param() {
        let err = ApiError::bad_request("Invalid value")
            .with_param("temperature")
            .with_code("invalid_type");

        assert_eq!(err.response.error.param, Some("temperature".to_string()));
        assert_eq!(err.response.error.code, Some("invalid_type".to_string()));
    }

    #[test]
    fn test_domain_error_status_mapping() {
        let cases = [
            (DomainError::validation("bad"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("gone"), StatusCode::NOT_FOUND),
            (DomainError::empty_document("empty"), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::configuration("OPENAI_API_KEY is not set"), StatusCode::SERVICE_UNAVAILABLE),
            (DomainError::provider("openai", "HTTP 500"), StatusCode::BAD_GATEWAY),
            (DomainError::timeout("gemini", 100), StatusCode::GATEWAY_TIMEOUT),
            (DomainError::storage("pool closed"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (domain_err, status) in cases {
            assert_eq!(ApiError::from(domain_err).status, status);
        }
    }

    #[test]
    fn test_configuration_message_names_credential() {
        let err = ApiError::from(DomainError::configuration(
            "ANTHROPIC_API_KEY is not set; configure it to use the ANTHROPIC provider",
        ));
        assert!(err.response.error.message.contains("ANTHROPIC_API_KEY"));
        assert!(!err.response.error.retryable);
    }

    #[test]
    fn test_provider_details_are_hidden() {
        let err = ApiError::from(DomainError::provider(
            "openai",
            "HTTP 401: Incorrect API key provided: sk-live-123",
        ));

        assert!(!err.response.error.message.contains("sk-live"));
        assert!(err.response.error.retryable);

        let err = ApiError::from(DomainError::storage("password authentication failed for user rag"));
        assert!(!err.response.error.message.contains("password"));
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::from(DomainError::timeout("openai", 2500));
        let json = serde_json::to_value(&err.response).unwrap();

        assert_eq!(json["error"]["type"], "timeout_error");
        assert_eq!(json["error"]["retryable"], true);

        let json = serde_json::to_value(ApiError::bad_request("x").response).unwrap();
        assert!(json["error"].get("retryable").is_none());
    }
}

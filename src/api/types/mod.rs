//! HTTP request and response types

pub mod configuration;
pub mod error;
pub mod json;
pub mod knowledge_base;

pub use configuration::{ConfigurationResponse, CredentialStatusView};
pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
pub use knowledge_base::{DeletedResponse, IngestDocumentsRequest, QueryBody, MAX_TIMEOUT_MS};

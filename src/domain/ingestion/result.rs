//! Ingestion inputs and per-document outcomes

use serde::{Deserialize, Serialize};

use crate::domain::knowledge_base::Metadata;
use crate::domain::DomainError;

/// One document handed to batch ingestion: extracted text plus metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl DocumentInput {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// Acknowledgement for a successfully ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReceipt {
    pub document_id: String,
    pub chunks: usize,
}

/// Why a document was not ingested, safe to show to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionError {
    pub kind: String,
    pub message: String,
    pub retryable: bool,
}

impl IngestionError {
    /// Keep precise messages for caller mistakes; hide provider and store internals
    pub fn from_domain(err: &DomainError) -> Self {
        let (kind, message) = match err {
            DomainError::EmptyDocument { .. }
            | DomainError::Validation { .. }
            | DomainError::Configuration { .. }
            | DomainError::Timeout { .. } => (error_kind(err), err.to_string()),
            DomainError::Provider { provider, .. } => (
                error_kind(err),
                format!("Embedding request to {} failed", provider),
            ),
            DomainError::Storage { .. } => {
                (error_kind(err), "Failed to store document chunks".to_string())
            }
            DomainError::NotFound { .. } | DomainError::Internal { .. } => {
                (error_kind(err), "Unexpected ingestion failure".to_string())
            }
        };

        Self {
            kind: kind.to_string(),
            message,
            retryable: err.is_retryable(),
        }
    }
}

fn error_kind(err: &DomainError) -> &'static str {
    match err {
        DomainError::EmptyDocument { .. } => "empty_document",
        DomainError::Validation { .. } => "validation",
        DomainError::Configuration { .. } => "configuration",
        DomainError::Provider { .. } => "provider",
        DomainError::Timeout { .. } => "timeout",
        DomainError::Storage { .. } => "storage",
        DomainError::NotFound { .. } => "not_found",
        DomainError::Internal { .. } => "internal",
    }
}

/// Outcome of one document within a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionResult {
    /// Position of the document in the submitted batch
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub chunks_created: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<IngestionError>,
}

impl IngestionResult {
    pub fn success(index: usize, receipt: IngestionReceipt, file_name: Option<String>) -> Self {
        Self {
            index,
            document_id: Some(receipt.document_id),
            file_name,
            chunks_created: receipt.chunks,
            error: None,
        }
    }

    pub fn failed(
        index: usize,
        document_id: Option<String>,
        file_name: Option<String>,
        error: IngestionError,
    ) -> Self {
        Self {
            index,
            document_id,
            file_name,
            chunks_created: 0,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of ingesting several documents independently
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchIngestionResult {
    pub total_documents: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<IngestionResult>,
}

impl BatchIngestionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: IngestionResult) {
        self.total_documents += 1;

        if result.is_success() {
            self.successful += 1;
        } else {
            self.failed += 1;
        }

        self.results.push(result);
    }

    /// A batch is accepted when at least one document made it in
    pub fn succeeded(&self) -> bool {
        self.successful > 0
    }

    pub fn total_chunks_created(&self) -> usize {
        self.results.iter().map(|r| r.chunks_created).sum()
    }

    pub fn errors(&self) -> impl Iterator<Item = &IngestionResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

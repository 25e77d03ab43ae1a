//! Knowledge base request and response bodies

use serde::{Deserialize, Serialize};

use crate::domain::ingestion::DocumentInput;
use crate::domain::llm::ConversationTurn;
use crate::domain::rag::QueryRequest;

/// Largest per-request provider timeout a caller may ask for
pub const MAX_TIMEOUT_MS: u64 = 300_000;

#[derive(Debug, Clone, Deserialize)]
pub struct IngestDocumentsRequest {
    pub documents: Vec<DocumentInput>,
    /// Bound applied to each embedding call made for this batch
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryBody {
    pub question: String,
    #[serde(default)]
    pub prompt_instructions: Option<String>,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    /// Bound applied to each provider call made for this query
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl QueryBody {
    pub fn into_request(self) -> QueryRequest {
        QueryRequest {
            question: self.question,
            prompt_instructions: self.prompt_instructions,
            history: self.history,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

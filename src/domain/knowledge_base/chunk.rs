//! Chunk types flowing from ingestion to citation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::KnowledgeBaseId;

/// Arbitrary document metadata, carried verbatim onto every chunk
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key holding the owning document id
pub const DOCUMENT_ID_KEY: &str = "documentId";

/// Metadata key holding the source file name
pub const FILE_NAME_KEY: &str = "fileName";

/// A split segment of document text, not yet embedded
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub content: String,
    pub metadata: Metadata,
}

impl TextChunk {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// A chunk paired with its embedding, ready to persist
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub content: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

impl EmbeddedChunk {
    pub fn new(chunk: TextChunk, embedding: Vec<f32>) -> Self {
        Self {
            content: chunk.content,
            metadata: chunk.metadata,
            embedding,
        }
    }
}

/// A persisted chunk as returned by similarity search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: Uuid,
    pub knowledge_base_id: KnowledgeBaseId,
    pub content: String,
    pub metadata: Metadata,
}

impl StoredChunk {
    pub fn file_name(&self) -> Option<String> {
        metadata_string(&self.metadata, FILE_NAME_KEY)
    }

    pub fn document_id(&self) -> Option<String> {
        metadata_string(&self.metadata, DOCUMENT_ID_KEY)
    }

    /// Human-readable label used in context blocks and the Sources list
    pub fn source_label(&self) -> String {
        let mut parts = Vec::with_capacity(2);

        if let Some(file_name) = self.file_name() {
            parts.push(file_name);
        }

        if let Some(document_id) = self.document_id() {
            parts.push(format!("documentId={}", document_id));
        }

        if parts.is_empty() {
            "unknown".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

/// A stored chunk with its cosine similarity to the query vector
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: StoredChunk,
    pub score: f32,
}

/// Read a metadata value as a non-empty string, accepting numbers as well
pub fn metadata_string(metadata: &Metadata, key: &str) -> Option<String> {
    match metadata.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

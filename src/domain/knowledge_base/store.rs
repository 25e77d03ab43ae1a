//! Vector store trait

use std::fmt::Debug;

use async_trait::async_trait;
use uuid::Uuid;

use super::chunk::{EmbeddedChunk, ScoredChunk, TextChunk};
use super::KnowledgeBaseId;
use crate::domain::embedding::TextEmbedder;
use crate::domain::DomainError;

/// Inclusive bounds applied to every top-k request
pub const MIN_TOP_K: usize = 2;
pub const MAX_TOP_K: usize = 12;

/// Clamp a requested result count into the supported range
pub fn clamp_top_k(k: usize) -> usize {
    k.clamp(MIN_TOP_K, MAX_TOP_K)
}

/// Persistent, KB-partitioned store of embedded chunks
#[async_trait]
pub trait VectorStore: Send + Sync + Debug {
    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;

    /// Create the backing structures if missing. Safe to call from every request path.
    async fn ensure_schema(&self) -> Result<(), DomainError>;

    /// Persist already-embedded chunks under `kb_id`, returning their generated ids
    async fn add_vectors(
        &self,
        kb_id: &KnowledgeBaseId,
        chunks: Vec<EmbeddedChunk>,
    ) -> Result<Vec<Uuid>, DomainError>;

    /// Return up to `k` chunks of `kb_id` ordered by descending cosine similarity
    async fn similarity_search_vector_with_score(
        &self,
        kb_id: &KnowledgeBaseId,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, DomainError>;

    /// Remove every chunk of a knowledge base
    async fn delete_by_knowledge_base(&self, kb_id: &KnowledgeBaseId) -> Result<u64, DomainError>;

    /// Remove the chunks of one document inside a knowledge base
    async fn delete_by_document(
        &self,
        kb_id: &KnowledgeBaseId,
        document_id: &str,
    ) -> Result<u64, DomainError>;

    async fn health_check(&self) -> Result<bool, DomainError>;

    /// Embed the chunks, then persist them. Embedding finishes before the store is touched.
    async fn add_documents(
        &self,
        kb_id: &KnowledgeBaseId,
        chunks: Vec<TextChunk>,
        embedder: &dyn TextEmbedder,
    ) -> Result<Vec<Uuid>, DomainError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_documents(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(DomainError::provider(
                embedder.provider_name(),
                format!(
                    "Expected {} embeddings, received {}",
                    chunks.len(),
                    embeddings.len()
                ),
            ));
        }

        let embedded = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk::new(chunk, embedding))
            .collect();

        self.add_vectors(kb_id, embedded).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_top_k() {
        assert_eq!(clamp_top_k(0), 2);
        assert_eq!(clamp_top_k(1), 2);
        assert_eq!(clamp_top_k(4), 4);
        assert_eq!(clamp_top_k(12), 12);
        assert_eq!(clamp_top_k(50), 12);
    }
}

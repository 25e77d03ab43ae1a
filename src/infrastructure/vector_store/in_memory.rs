//! In-process vector store with exact cosine ranking

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::embedding::cosine_similarity;
use crate::domain::knowledge_base::{
    metadata_string, EmbeddedChunk, KnowledgeBaseId, ScoredChunk, StoredChunk, VectorStore,
    DOCUMENT_ID_KEY,
};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
struct Entry {
    chunk: StoredChunk,
    embedding: Vec<f32>,
}

/// Keeps every knowledge base in memory; contents are lost on restart.
///
/// When `dimensions` is set, embeddings of any other length are rejected the
/// same way the pgvector store rejects them.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    dimensions: Option<usize>,
    partitions: RwLock<HashMap<KnowledgeBaseId, Vec<Entry>>>,
}

impl InMemoryVectorStore {
    /// Create an empty store accepting embeddings of any length
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that rejects embeddings of another length
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: Some(dimensions),
            partitions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of chunks held for `kb_id`
    pub async fn chunk_count(&self, kb_id: &KnowledgeBaseId) -> usize {
        self.partitions
            .read()
            .await
            .get(kb_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn check_embedding(&self, embedding: &[f32]) -> Result<(), DomainError> {
        match self.dimensions {
            Some(expected) if embedding.len() != expected => Err(DomainError::configuration(format!(
                "Embedding has {} dimensions but the vector store expects {}; \
                 changing embedding backends requires a re-index",
                embedding.len(),
                expected
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend_name(&self) -> &'static str {
        "in_memory"
    }

    async fn ensure_schema(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn add_vectors(
        &self,
        kb_id: &KnowledgeBaseId,
        chunks: Vec<EmbeddedChunk>,
    ) -> Result<Vec<Uuid>, DomainError> {
        for chunk in &chunks {
            self.check_embedding(&chunk.embedding)?;
        }

        let mut partitions = self.partitions.write().await;
        let partition = partitions.entry(kb_id.clone()).or_default();
        let mut ids = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let id = Uuid::new_v4();
            partition.push(Entry {
                chunk: StoredChunk {
                    id,
                    knowledge_base_id: kb_id.clone(),
                    content: chunk.content,
                    metadata: chunk.metadata,
                },
                embedding: chunk.embedding,
            });
            ids.push(id);
        }

        Ok(ids)
    }

    async fn similarity_search_vector_with_score(
        &self,
        kb_id: &KnowledgeBaseId,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, DomainError> {
        self.check_embedding(query)?;

        let partitions = self.partitions.read().await;
        let Some(entries) = partitions.get(kb_id) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredChunk> = entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        // stable: ties keep insertion order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);

        Ok(scored)
    }

    async fn delete_by_knowledge_base(&self, kb_id: &KnowledgeBaseId) -> Result<u64, DomainError> {
        let removed = self.partitions.write().await.remove(kb_id);
        Ok(removed.map(|entries| entries.len() as u64).unwrap_or(0))
    }

    async fn delete_by_document(
        &self,
        kb_id: &KnowledgeBaseId,
        document_id: &str,
    ) -> Result<u64, DomainError> {
        let mut partitions = self.partitions.write().await;
        let Some(entries) = partitions.get_mut(kb_id) else {
            return Ok(0);
        };

        let before = entries.len();
        entries.retain(|entry| {
            metadata_string(&entry.chunk.metadata, DOCUMENT_ID_KEY).as_deref() != Some(document_id)
        });

        Ok((before - entries.len()) as u64)
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        Ok(true)
    }
}

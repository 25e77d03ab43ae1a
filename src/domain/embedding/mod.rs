//! Embedding domain: the embedder seam and vector similarity

mod similarity;

pub use similarity::cosine_similarity;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Turns text into fixed-dimension vectors
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed many texts; output order matches input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    fn provider_name(&self) -> &'static str;
}

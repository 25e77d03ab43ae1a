//! Knowledge base domain: identifiers, chunks and the vector store seam

mod chunk;
mod id;
mod store;

pub use chunk::{
    metadata_string, EmbeddedChunk, Metadata, ScoredChunk, StoredChunk, TextChunk,
    DOCUMENT_ID_KEY, FILE_NAME_KEY,
};
pub use id::{KnowledgeBaseId, KnowledgeBaseIdError, MAX_KB_ID_LENGTH};
pub use store::{clamp_top_k, VectorStore, MAX_TOP_K, MIN_TOP_K};

//! Ingestion domain: splitting contract and per-document results

mod chunker;
mod result;

pub use chunker::{ChunkingConfig, TextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use result::{
    BatchIngestionResult, DocumentInput, IngestionError, IngestionReceipt, IngestionResult,
};

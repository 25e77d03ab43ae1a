pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod knowledge_base;
pub mod llm;
pub mod provider_config;
pub mod rag;

pub use error::DomainError;

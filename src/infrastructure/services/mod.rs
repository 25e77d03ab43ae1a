//! Infrastructure services

mod config_service;
mod rag_service;

pub use config_service::{ConfigService, CredentialStatus};
pub use rag_service::{RagService, RagSettings};

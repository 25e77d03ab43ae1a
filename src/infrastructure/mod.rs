//! Infrastructure layer - External service implementations

pub mod credentials;
pub mod database;
pub mod embedding;
pub mod http_client;
pub mod ingestion;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod provider;
pub mod provider_config;
pub mod services;
pub mod vector_store;

//! CLI module for Knowledge RAG
//!
//! Provides subcommands for running the service and operating on knowledge bases:
//! - `serve`: HTTP API server
//! - `migrate`: create the database schema and exit
//! - `ingest` / `query`: one-off document operations against the configured store

pub mod documents;
pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Knowledge RAG - Retrieval-augmented answers over per-tenant document collections
#[derive(Parser)]
#[command(name = "knowledge-rag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Create the vector table, its indexes and the configuration table
    Migrate,

    /// Ingest an extracted UTF-8 text file into a knowledge base
    Ingest(documents::IngestArgs),

    /// Ask a question against a knowledge base and print the answer
    Query(documents::QueryArgs),
}

/// Load `.env`, the layered configuration and the log subscriber
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}

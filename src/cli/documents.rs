//! Ingest and query commands

use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::Value;
use tracing::warn;

use crate::config::VectorStoreBackend;
use crate::domain::knowledge_base::{KnowledgeBaseId, Metadata, DOCUMENT_ID_KEY, FILE_NAME_KEY};
use crate::domain::rag::QueryRequest;

/// Arguments for the ingest command
#[derive(Args, Clone, Debug)]
pub struct IngestArgs {
    /// Knowledge base to ingest into
    #[arg(long)]
    pub kb: String,

    /// UTF-8 text file with the extracted document text
    #[arg(long)]
    pub file: PathBuf,

    /// Document id used for later deletion (generated when omitted)
    #[arg(long)]
    pub document_id: Option<String>,

    /// Label shown in citations (defaults to the file name)
    #[arg(long)]
    pub file_name: Option<String>,
}

/// Arguments for the query command
#[derive(Args, Clone, Debug)]
pub struct QueryArgs {
    /// Knowledge base to search
    #[arg(long)]
    pub kb: String,

    /// The question to answer
    #[arg(long)]
    pub question: String,

    /// Extra instructions appended to the system rules
    #[arg(long)]
    pub instructions: Option<String>,
}

/// Ingest one file and print the receipt as JSON
pub async fn ingest(args: IngestArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    warn_if_ephemeral(config.vector_store.backend);

    let kb_id = KnowledgeBaseId::new(args.kb.clone())?;
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.file.display(), e))?;

    let state = crate::create_app_state_with_config(&config).await?;
    let receipt = state
        .rag_service
        .ingest_document(&kb_id, &text, ingest_metadata(&args))
        .await?;

    println!("{}", serde_json::to_string_pretty(&receipt)?);

    Ok(())
}

/// Answer one question and print the answer text
pub async fn query(args: QueryArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    warn_if_ephemeral(config.vector_store.backend);

    let kb_id = KnowledgeBaseId::new(args.kb)?;

    let mut request = QueryRequest::new(args.question);
    if let Some(instructions) = args.instructions {
        request = request.with_instructions(instructions);
    }

    let state = crate::create_app_state_with_config(&config).await?;
    let answer = state.rag_service.query(&kb_id, request).await?;

    println!("{}", answer.answer);

    Ok(())
}

fn warn_if_ephemeral(backend: VectorStoreBackend) {
    if backend == VectorStoreBackend::InMemory {
        warn!("The in-memory backend does not persist between commands");
    }
}

fn ingest_metadata(args: &IngestArgs) -> Metadata {
    let mut metadata = Metadata::new();

    if let Some(document_id) = &args.document_id {
        metadata.insert(DOCUMENT_ID_KEY.to_string(), Value::String(document_id.clone()));
    }

    let file_name = args
        .file_name
        .clone()
        .or_else(|| file_label(&args.file));

    if let Some(file_name) = file_name {
        metadata.insert(FILE_NAME_KEY.to_string(), Value::String(file_name));
    }

    metadata
}

fn file_label(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

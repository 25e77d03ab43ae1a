//! RAG service - Ingestion and retrieval-augmented answering

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use uuid::Uuid;

use crate::config::RagConfig;
use crate::domain::embedding::TextEmbedder;
use crate::domain::ingestion::{
    BatchIngestionResult, ChunkingConfig, DocumentInput, IngestionError, IngestionReceipt,
    IngestionResult, TextSplitter,
};
use crate::domain::knowledge_base::{
    clamp_top_k, metadata_string, KnowledgeBaseId, Metadata, VectorStore, DOCUMENT_ID_KEY,
    FILE_NAME_KEY,
};
use crate::domain::provider_config::ProviderConfigRepository;
use crate::domain::rag::{
    build_context, format_answer, number_sources, recent_history, system_rules, PromptParts,
    QueryRequest, RagAnswer, SourceRef, DEFAULT_HISTORY_LIMIT,
};
use crate::domain::DomainError;
use crate::infrastructure::ingestion::RecursiveCharacterSplitter;
use crate::infrastructure::llm::{Completion, CompletionModel};
use crate::infrastructure::metrics;
use crate::infrastructure::provider::ProviderRegistry;

/// Documents of one batch processed at the same time
const MAX_CONCURRENT_DOCUMENTS: usize = 4;

/// Retrieval and chunking settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RagSettings {
    pub top_k: usize,
    pub history_limit: usize,
    pub chunking: ChunkingConfig,
}

impl RagSettings {
    /// Validate and copy the retrieval settings from configuration
    pub fn from_config(config: &RagConfig) -> Result<Self, DomainError> {
        Ok(Self {
            top_k: clamp_top_k(config.top_k),
            history_limit: config.history_limit,
            chunking: ChunkingConfig::new(config.chunk_size, config.chunk_overlap)?,
        })
    }
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            history_limit: DEFAULT_HISTORY_LIMIT,
            chunking: ChunkingConfig::default(),
        }
    }
}

/// Ingests documents into and answers questions against knowledge bases
#[derive(Clone)]
pub struct RagService {
    store: Arc<dyn VectorStore>,
    config_repository: Arc<dyn ProviderConfigRepository>,
    providers: ProviderRegistry,
    splitter: Arc<dyn TextSplitter>,
    settings: RagSettings,
}

impl fmt::Debug for RagService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagService")
            .field("store", &self.store.backend_name())
            .field("splitter", &self.splitter.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl RagService {
    /// Create a new RAG service
    pub fn new(
        store: Arc<dyn VectorStore>,
        config_repository: Arc<dyn ProviderConfigRepository>,
        providers: ProviderRegistry,
        settings: RagSettings,
    ) -> Self {
        Self {
            store,
            config_repository,
            providers,
            splitter: Arc::new(RecursiveCharacterSplitter::new(settings.chunking)),
            settings,
        }
    }

    /// A handle whose provider calls are each bounded by `timeout`
    pub fn with_provider_timeout(&self, timeout: Duration) -> Self {
        let mut service = self.clone();
        service.providers = self.providers.clone().with_timeout(timeout);
        service
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn config_repository(&self) -> &Arc<dyn ProviderConfigRepository> {
        &self.config_repository
    }

    /// Chunk, embed and store one document.
    ///
    /// A `documentId` is generated and written into the metadata when absent, so
    /// the document can always be deleted on its own later.
    pub async fn ingest_document(
        &self,
        kb_id: &KnowledgeBaseId,
        text: &str,
        mut metadata: Metadata,
    ) -> Result<IngestionReceipt, DomainError> {
        let document_id = match metadata_string(&metadata, DOCUMENT_ID_KEY) {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                metadata.insert(DOCUMENT_ID_KEY.to_string(), id.clone().into());
                id
            }
        };

        let chunks = self.splitter.split(text, &metadata);

        if chunks.is_empty() {
            return Err(DomainError::empty_document(
                "Document contains no extractable text",
            ));
        }

        self.store.ensure_schema().await?;

        let config = self.config_repository.load().await?;
        let embedder = self.providers.embeddings(&config)?;

        tracing::debug!(
            kb_id = kb_id.as_str(),
            document_id = %document_id,
            chunks = chunks.len(),
            embedder = embedder.provider_name(),
            "Ingesting document"
        );

        let ids = self.store.add_documents(kb_id, chunks, &embedder).await?;

        metrics::record_ingestion(ids.len());
        tracing::info!(
            kb_id = kb_id.as_str(),
            document_id = %document_id,
            chunks = ids.len(),
            "Document ingested"
        );

        Ok(IngestionReceipt {
            document_id,
            chunks: ids.len(),
        })
    }

    /// Ingest every document independently; one failure never aborts its siblings
    pub async fn ingest_documents(
        &self,
        kb_id: &KnowledgeBaseId,
        documents: Vec<DocumentInput>,
    ) -> BatchIngestionResult {
        let results: Vec<IngestionResult> = stream::iter(documents.into_iter().enumerate())
            .map(|(index, document)| self.ingest_one(kb_id, index, document))
            .buffered(MAX_CONCURRENT_DOCUMENTS)
            .collect()
            .await;

        let mut batch = BatchIngestionResult::new();
        for result in results {
            batch.add(result);
        }

        tracing::info!(
            kb_id = kb_id.as_str(),
            total = batch.total_documents,
            successful = batch.successful,
            failed = batch.failed,
            "Batch ingestion finished"
        );

        batch
    }

    async fn ingest_one(
        &self,
        kb_id: &KnowledgeBaseId,
        index: usize,
        document: DocumentInput,
    ) -> IngestionResult {
        let file_name = metadata_string(&document.metadata, FILE_NAME_KEY);
        let document_id = metadata_string(&document.metadata, DOCUMENT_ID_KEY);

        match self
            .ingest_document(kb_id, &document.text, document.metadata)
            .await
        {
            Ok(receipt) => IngestionResult::success(index, receipt, file_name),
            Err(e) => {
                let error = IngestionError::from_domain(&e);

                tracing::warn!(
                    kb_id = kb_id.as_str(),
                    index,
                    file_name = file_name.as_deref().unwrap_or("unknown"),
                    error = %e,
                    "Document ingestion failed"
                );
                metrics::record_ingestion_failure(&error.kind);

                IngestionResult::failed(index, document_id, file_name, error)
            }
        }
    }

    /// Answer `request` from the chunks of `kb_id`
    pub async fn query(
        &self,
        kb_id: &KnowledgeBaseId,
        request: QueryRequest,
    ) -> Result<RagAnswer, DomainError> {
        let result = self.answer(kb_id, request).await;

        match &result {
            Ok(answer) if answer.sources.is_empty() => metrics::record_query("no_documents"),
            Ok(_) => metrics::record_query("answered"),
            Err(DomainError::Timeout { .. }) => metrics::record_query("timeout"),
            Err(_) => metrics::record_query("error"),
        }

        result
    }

    async fn answer(
        &self,
        kb_id: &KnowledgeBaseId,
        request: QueryRequest,
    ) -> Result<RagAnswer, DomainError> {
        let question = request.question.trim();

        if question.is_empty() {
            return Err(DomainError::validation("Question must not be empty"));
        }

        let config = self.config_repository.load().await?;
        let embedder = self.providers.embeddings(&config)?;
        let model = self.providers.completion_model(&config)?;

        let query_vector = embedder.embed_query(question).await?;
        let results = self
            .store
            .similarity_search_vector_with_score(kb_id, &query_vector, self.settings.top_k)
            .await?;

        if results.is_empty() {
            tracing::info!(kb_id = kb_id.as_str(), "No chunks retrieved; skipping completion");
            return Ok(RagAnswer::no_documents());
        }

        let sources = number_sources(&results);
        let parts = PromptParts {
            system: system_rules(request.prompt_instructions.as_deref()),
            history: recent_history(&request.history, self.settings.history_limit),
            context: build_context(&sources),
            question: question.to_string(),
        };

        tracing::debug!(
            kb_id = kb_id.as_str(),
            sources = sources.len(),
            history = parts.history.len(),
            provider = model.provider().label(),
            model = model.model(),
            "Invoking completion"
        );

        let completion = complete_with_fallback(&model, &parts).await?;

        Ok(RagAnswer {
            answer: format_answer(&completion.text, &sources),
            sources: sources.iter().map(SourceRef::from).collect(),
        })
    }

    pub async fn delete_knowledge_base(&self, kb_id: &KnowledgeBaseId) -> Result<u64, DomainError> {
        self.store.delete_by_knowledge_base(kb_id).await
    }

    pub async fn delete_document(
        &self,
        kb_id: &KnowledgeBaseId,
        document_id: &str,
    ) -> Result<u64, DomainError> {
        let document_id = document_id.trim();

        if document_id.is_empty() {
            return Err(DomainError::validation("Document id must not be empty"));
        }

        self.store.delete_by_document(kb_id, document_id).await
    }
}

/// Structured messages first; on a non-timeout failure, one plain-text retry
async fn complete_with_fallback(
    model: &CompletionModel,
    parts: &PromptParts,
) -> Result<Completion, DomainError> {
    match model.invoke(&parts.to_messages()).await {
        Ok(completion) => Ok(completion),
        Err(e @ DomainError::Timeout { .. }) => Err(e),
        Err(e) => {
            tracing::warn!(
                provider = model.provider().label(),
                error = %e,
                "Structured completion failed, retrying with a plain-text prompt"
            );
            metrics::record_completion_fallback(model.provider().label());

            model.invoke(&parts.to_plain_text()).await
        }
    }
}

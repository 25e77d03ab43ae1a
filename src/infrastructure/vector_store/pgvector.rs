//! PostgreSQL + pgvector vector store

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{Row, Transaction};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::domain::knowledge_base::{
    EmbeddedChunk, KnowledgeBaseId, ScoredChunk, StoredChunk, VectorStore, DOCUMENT_ID_KEY,
};
use crate::domain::DomainError;

pub const DEFAULT_TABLE_NAME: &str = "kb_chunks";
pub const DEFAULT_DIMENSIONS: usize = 1536;

/// pgvector cannot build HNSW indexes on wider `vector` columns
pub const MAX_INDEXED_DIMENSIONS: usize = 2000;

/// Advisory lock serialising schema bootstrap across processes
const SCHEMA_LOCK_KEY: i64 = 0x6b62_6368_756e_6b73;

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").expect("valid identifier pattern"));

/// Configuration for the pgvector store
#[derive(Debug, Clone, PartialEq)]
pub struct PgvectorConfig {
    pub table_name: String,
    /// Length of every stored embedding; fixed once the table exists
    pub dimensions: usize,
    pub hnsw_m: u32,
    pub hnsw_ef_construction: u32,
}

impl PgvectorConfig {
    /// Create a new pgvector configuration
    pub fn new(dimensions: usize) -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            dimensions,
            hnsw_m: 16,
            hnsw_ef_construction: 64,
        }
    }

    /// Set the table name
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Reject table names that cannot be interpolated into DDL
    pub fn validate(&self) -> Result<(), DomainError> {
        if !IDENTIFIER_PATTERN.is_match(&self.table_name) {
            return Err(DomainError::configuration(format!(
                "Invalid vector table name '{}': use lowercase letters, digits and underscores",
                self.table_name
            )));
        }

        if self.dimensions == 0 || self.dimensions > MAX_INDEXED_DIMENSIONS {
            return Err(DomainError::configuration(format!(
                "Vector dimensions must be between 1 and {}, got {}",
                MAX_INDEXED_DIMENSIONS, self.dimensions
            )));
        }

        Ok(())
    }

    /// Idempotent DDL, in execution order
    pub fn schema_statements(&self) -> Vec<String> {
        let t = &self.table_name;

        vec![
            "CREATE EXTENSION IF NOT EXISTS vector".to_string(),
            format!(
                "CREATE TABLE IF NOT EXISTS {t} (\
                 id UUID PRIMARY KEY, \
                 kb_id TEXT NOT NULL, \
                 content TEXT NOT NULL, \
                 metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb, \
                 embedding vector({dims}) NOT NULL, \
                 created_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
                dims = self.dimensions
            ),
            format!("CREATE INDEX IF NOT EXISTS {t}_kb_id_idx ON {t} (kb_id)"),
            format!(
                "CREATE INDEX IF NOT EXISTS {t}_document_idx ON {t} (kb_id, (metadata->>'{DOCUMENT_ID_KEY}'))"
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS {t}_embedding_hnsw_idx ON {t} \
                 USING hnsw (embedding vector_cosine_ops) WITH (m = {m}, ef_construction = {ef})",
                m = self.hnsw_m,
                ef = self.hnsw_ef_construction
            ),
        ]
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (id, kb_id, content, metadata, embedding) VALUES ($1, $2, $3, $4, $5::vector)",
            self.table_name
        )
    }

    fn search_sql(&self) -> String {
        format!(
            "SELECT id, content, metadata, 1 - (embedding <=> $1::vector) AS score \
             FROM {} WHERE kb_id = $2 ORDER BY embedding <=> $1::vector LIMIT $3",
            self.table_name
        )
    }

    fn delete_kb_sql(&self) -> String {
        format!("DELETE FROM {} WHERE kb_id = $1", self.table_name)
    }

    fn delete_document_sql(&self) -> String {
        format!(
            "DELETE FROM {} WHERE kb_id = $1 AND metadata->>'{}' = $2",
            self.table_name, DOCUMENT_ID_KEY
        )
    }
}

impl Default for PgvectorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

/// Candidate list size for an HNSW scan returning `k` rows after the kb_id filter
pub fn ef_search_for(k: usize) -> usize {
    (k * 10).clamp(40, 1000)
}

/// Transaction-local setting for the approximate HNSW pass
pub fn hnsw_search_setting(k: usize) -> String {
    format!("SET LOCAL hnsw.ef_search = {}", ef_search_for(k))
}

/// Transaction-local setting that keeps the planner off the HNSW index.
///
/// The kb_id filter runs after the index scan, so a knowledge base holding a
/// small share of the table can lose every candidate; the exact pass scans
/// that knowledge base's rows through the kb_id index instead.
pub const EXACT_SEARCH_SETTING: &str = "SET LOCAL enable_indexscan = off";

/// Format an embedding as a pgvector text literal
pub fn to_pgvector_literal(embedding: &[f32]) -> String {
    let values: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

/// Chunks of every knowledge base in one table, partitioned by `kb_id`
#[derive(Debug)]
pub struct PgvectorStore {
    pool: PgPool,
    config: PgvectorConfig,
    schema_ready: OnceCell<()>,
}

impl PgvectorStore {
    /// Create a store over `pool`; the schema is created on first use
    pub fn new(pool: PgPool, config: PgvectorConfig) -> Result<Self, DomainError> {
        config.validate()?;

        Ok(Self {
            pool,
            config,
            schema_ready: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &PgvectorConfig {
        &self.config
    }

    async fn bootstrap(&self) -> Result<(), DomainError> {
        tracing::info!(
            table = %self.config.table_name,
            dimensions = self.config.dimensions,
            "Ensuring vector store schema"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCHEMA_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        for statement in self.config.schema_statements() {
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| DomainError::storage(format!("Schema bootstrap failed: {}", e)))?;
        }

        tx.commit().await?;

        Ok(())
    }

    fn check_embedding(&self, embedding: &[f32]) -> Result<(), DomainError> {
        if embedding.len() != self.config.dimensions {
            return Err(DomainError::configuration(format!(
                "Embedding has {} dimensions but the vector store expects {}; \
                 changing embedding backends requires a re-index",
                embedding.len(),
                self.config.dimensions
            )));
        }

        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(DomainError::validation("Embedding contains non-finite values"));
        }

        Ok(())
    }

    async fn fetch_nearest(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kb_id: &KnowledgeBaseId,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<PgRow>, DomainError> {
        let rows = sqlx::query(&self.config.search_sql())
            .bind(to_pgvector_literal(query))
            .bind(kb_id.as_str())
            .bind(k as i64)
            .fetch_all(&mut **tx)
            .await?;

        Ok(rows)
    }

    fn row_to_scored(kb_id: &KnowledgeBaseId, row: &PgRow) -> Result<ScoredChunk, DomainError> {
        let metadata = match row.try_get::<Value, _>("metadata")? {
            Value::Object(map) => map,
            _ => Default::default(),
        };
        let score: f64 = row.try_get("score")?;

        Ok(ScoredChunk {
            chunk: StoredChunk {
                id: row.try_get("id")?,
                knowledge_base_id: kb_id.clone(),
                content: row.try_get("content")?,
                metadata,
            },
            score: score as f32,
        })
    }
}

#[async_trait]
impl VectorStore for PgvectorStore {
    fn backend_name(&self) -> &'static str {
        "pgvector"
    }

    async fn ensure_schema(&self) -> Result<(), DomainError> {
        self.schema_ready
            .get_or_try_init(|| self.bootstrap())
            .await
            .map(|_| ())
    }

    async fn add_vectors(
        &self,
        kb_id: &KnowledgeBaseId,
        chunks: Vec<EmbeddedChunk>,
    ) -> Result<Vec<Uuid>, DomainError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        for chunk in &chunks {
            self.check_embedding(&chunk.embedding)?;
        }

        self.ensure_schema().await?;

        let sql = self.config.insert_sql();
        let mut ids = Vec::with_capacity(chunks.len());
        let mut tx = self.pool.begin().await?;

        for chunk in chunks {
            let id = Uuid::new_v4();

            sqlx::query(&sql)
                .bind(id)
                .bind(kb_id.as_str())
                .bind(chunk.content.replace('\0', ""))
                .bind(Value::Object(chunk.metadata))
                .bind(to_pgvector_literal(&chunk.embedding))
                .execute(&mut *tx)
                .await?;

            ids.push(id);
        }

        tx.commit().await?;

        tracing::debug!(kb_id = kb_id.as_str(), chunks = ids.len(), "Inserted chunks");

        Ok(ids)
    }

    async fn similarity_search_vector_with_score(
        &self,
        kb_id: &KnowledgeBaseId,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, DomainError> {
        self.check_embedding(query)?;

        if k == 0 {
            return Ok(Vec::new());
        }

        self.ensure_schema().await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(&hnsw_search_setting(k))
            .execute(&mut *tx)
            .await?;

        let mut rows = self.fetch_nearest(&mut tx, kb_id, query, k).await?;

        if rows.len() < k {
            sqlx::query(EXACT_SEARCH_SETTING).execute(&mut *tx).await?;

            let approximate = rows.len();
            rows = self.fetch_nearest(&mut tx, kb_id, query, k).await?;

            tracing::debug!(
                kb_id = kb_id.as_str(),
                approximate,
                exact = rows.len(),
                "HNSW pass returned fewer than k rows; used exact scan"
            );
        }

        tx.commit().await?;

        let results = rows
            .iter()
            .map(|row| Self::row_to_scored(kb_id, row))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            kb_id = kb_id.as_str(),
            k,
            results = results.len(),
            "Similarity search completed"
        );

        Ok(results)
    }

    async fn delete_by_knowledge_base(&self, kb_id: &KnowledgeBaseId) -> Result<u64, DomainError> {
        self.ensure_schema().await?;

        let result = sqlx::query(&self.config.delete_kb_sql())
            .bind(kb_id.as_str())
            .execute(&self.pool)
            .await?;

        tracing::info!(kb_id = kb_id.as_str(), deleted = result.rows_affected(), "Deleted knowledge base chunks");

        Ok(result.rows_affected())
    }

    async fn delete_by_document(
        &self,
        kb_id: &KnowledgeBaseId,
        document_id: &str,
    ) -> Result<u64, DomainError> {
        self.ensure_schema().await?;

        let result = sqlx::query(&self.config.delete_document_sql())
            .bind(kb_id.as_str())
            .bind(document_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(
            kb_id = kb_id.as_str(),
            document_id,
            deleted = result.rows_affected(),
            "Deleted document chunks"
        );

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }
}

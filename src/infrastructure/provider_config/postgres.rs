//! PostgreSQL-backed provider configuration

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tokio::sync::OnceCell;

use crate::domain::llm::GenerationParams;
use crate::domain::provider_config::{
    ProviderConfigRepository, ProviderConfiguration, DEFAULT_CONFIG_KEY,
};
use crate::domain::DomainError;

pub const CONFIG_TABLE: &str = "rag_configurations";

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS rag_configurations (
        key TEXT PRIMARY KEY,
        provider TEXT NOT NULL,
        model TEXT,
        temperature REAL,
        max_tokens INTEGER,
        top_p REAL,
        top_k INTEGER,
        frequency_penalty REAL,
        presence_penalty REAL,
        stop_sequences TEXT[],
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const COLUMNS: &str = "key, provider, model, temperature, max_tokens, top_p, top_k, \
    frequency_penalty, presence_penalty, stop_sequences";

const SELECT_SQL: &str = "SELECT provider, model, temperature, max_tokens, top_p, top_k, \
    frequency_penalty, presence_penalty, stop_sequences, updated_at \
    FROM rag_configurations WHERE key = $1";

/// Single-row configuration table, created and seeded on first use
#[derive(Debug)]
pub struct PostgresProviderConfigRepository {
    pool: PgPool,
    table_ready: OnceCell<()>,
}

impl PostgresProviderConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table_ready: OnceCell::new(),
        }
    }

    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        self.table_ready
            .get_or_try_init(|| async {
                sqlx::query(CREATE_TABLE_SQL)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        DomainError::storage(format!("Failed to create {}: {}", CONFIG_TABLE, e))
                    })?;
                Ok::<_, DomainError>(())
            })
            .await
            .map(|_| ())
    }

    fn upsert_sql(on_conflict: &str) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) {}",
            CONFIG_TABLE, COLUMNS, on_conflict
        )
    }

    async fn write(
        &self,
        config: &ProviderConfiguration,
        on_conflict: &str,
    ) -> Result<(), DomainError> {
        let params = &config.params;

        sqlx::query(&Self::upsert_sql(on_conflict))
            .bind(DEFAULT_CONFIG_KEY)
            .bind(config.provider.as_str())
            .bind(config.model.as_deref())
            .bind(params.temperature)
            .bind(params.max_tokens.map(to_i32))
            .bind(params.top_p)
            .bind(params.top_k.map(to_i32))
            .bind(params.frequency_penalty)
            .bind(params.presence_penalty)
            .bind(params.stop_sequences.clone())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn read(&self) -> Result<ProviderConfiguration, DomainError> {
        let row = sqlx::query(SELECT_SQL)
            .bind(DEFAULT_CONFIG_KEY)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DomainError::not_found("Provider configuration record is missing"))?;

        row_to_config(&row)
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_u32(value: Option<i32>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

fn row_to_config(row: &PgRow) -> Result<ProviderConfiguration, DomainError> {
    let provider: String = row.try_get("provider")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(ProviderConfiguration {
        provider: provider.parse()?,
        model: row.try_get("model")?,
        params: GenerationParams {
            temperature: row.try_get("temperature")?,
            max_tokens: to_u32(row.try_get("max_tokens")?),
            top_p: row.try_get("top_p")?,
            top_k: to_u32(row.try_get("top_k")?),
            frequency_penalty: row.try_get("frequency_penalty")?,
            presence_penalty: row.try_get("presence_penalty")?,
            stop_sequences: row.try_get("stop_sequences")?,
        },
        updated_at: Some(updated_at),
    })
}

#[async_trait]
impl ProviderConfigRepository for PostgresProviderConfigRepository {
    async fn load(&self) -> Result<ProviderConfiguration, DomainError> {
        self.ensure_table().await?;

        // concurrent first reads all try the insert; exactly one wins
        self.write(&ProviderConfiguration::default(), "ON CONFLICT (key) DO NOTHING")
            .await?;

        self.read().await
    }

    async fn save(
        &self,
        config: ProviderConfiguration,
    ) -> Result<ProviderConfiguration, DomainError> {
        config.validate()?;
        self.ensure_table().await?;

        self.write(
            &config,
            "ON CONFLICT (key) DO UPDATE SET \
             provider = EXCLUDED.provider, model = EXCLUDED.model, \
             temperature = EXCLUDED.temperature, max_tokens = EXCLUDED.max_tokens, \
             top_p = EXCLUDED.top_p, top_k = EXCLUDED.top_k, \
             frequency_penalty = EXCLUDED.frequency_penalty, \
             presence_penalty = EXCLUDED.presence_penalty, \
             stop_sequences = EXCLUDED.stop_sequences, updated_at = NOW()",
        )
        .await?;

        tracing::info!(provider = %config.provider, "Provider configuration updated");

        self.read().await
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }
}

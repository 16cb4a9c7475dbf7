//! Persistence collaborator: document lookup and pipeline output.
//!
//! Records are append-only rows; the structured payload is stored as JSONB.
//! See `migrations/0001_ingest.sql` for the schema.

use std::fmt;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::document::StoredDocument;
use crate::models::record::{JobPostingRecord, RecordStatus, StructuredRecord};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What a persisted record was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    Document(Uuid),
    Url(String),
    PastedText,
}

impl SourceRef {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceRef::Document(_) => "document",
            SourceRef::Url(_) => "url",
            SourceRef::PastedText => "text",
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Document(id) => write!(f, "{id}"),
            SourceRef::Url(url) => f.write_str(url),
            SourceRef::PastedText => f.write_str("pasted"),
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_document(
        &self,
        file_id: Uuid,
    ) -> Result<Option<StoredDocument>, PersistenceError>;

    async fn save_structured_record(
        &self,
        owner_id: Uuid,
        source: &SourceRef,
        record: &StructuredRecord,
    ) -> Result<Uuid, PersistenceError>;

    async fn save_job_posting(
        &self,
        owner_id: Option<Uuid>,
        source: &SourceRef,
        record: &JobPostingRecord,
    ) -> Result<Uuid, PersistenceError>;
}

fn status_str(status: RecordStatus) -> &'static str {
    match status {
        RecordStatus::Structured => "structured",
        RecordStatus::Degraded => "degraded",
    }
}

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_document(
        &self,
        file_id: Uuid,
    ) -> Result<Option<StoredDocument>, PersistenceError> {
        Ok(
            sqlx::query_as::<_, StoredDocument>("SELECT * FROM documents WHERE id = $1")
                .bind(file_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn save_structured_record(
        &self,
        owner_id: Uuid,
        source: &SourceRef,
        record: &StructuredRecord,
    ) -> Result<Uuid, PersistenceError> {
        let id = Uuid::new_v4();
        let data = serde_json::to_value(record)?;

        sqlx::query(
            r#"
            INSERT INTO structured_records
                (id, owner_id, source_kind, source_ref, status, schema_version, data,
                 extracted_text)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(source.kind())
        .bind(source.to_string())
        .bind(status_str(record.status))
        .bind(record.schema_version as i32)
        .bind(&data)
        .bind(&record.extracted_text)
        .execute(&self.pool)
        .await?;

        info!("Saved structured record {id} for owner {owner_id} ({})", source.kind());
        Ok(id)
    }

    async fn save_job_posting(
        &self,
        owner_id: Option<Uuid>,
        source: &SourceRef,
        record: &JobPostingRecord,
    ) -> Result<Uuid, PersistenceError> {
        let id = Uuid::new_v4();
        let data = serde_json::to_value(record)?;

        sqlx::query(
            r#"
            INSERT INTO job_postings
                (id, owner_id, source_kind, source_ref, status, schema_version, data, source_text)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(source.kind())
        .bind(source.to_string())
        .bind(status_str(record.status))
        .bind(record.schema_version as i32)
        .bind(&data)
        .bind(&record.source_text)
        .execute(&self.pool)
        .await?;

        info!("Saved job posting {id} ({})", source.kind());
        Ok(id)
    }
}

//! Pipeline Orchestrator: sequences one ingestion request end to end.
//!
//! Document path: lookup + ownership check → storage read → extract → normalize → persist.
//! Job path:      validate input → acquire (URL only) → normalize → persist.
//!
//! Any failing stage short-circuits; nothing is persisted for a failed request.
//! Dropping the returned future cancels whichever stage is in flight.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::acquisition::{AcquisitionError, ContentResolver, StrategyKind};
use crate::extraction::{DocumentExtractor, DocumentFormat, ExtractionError, RawDocument};
use crate::models::record::{JobPostingRecord, StructuredRecord};
use crate::normalizer::Normalizer;
use crate::persistence::{PersistenceError, RecordStore, SourceRef};
use crate::storage::{BlobStorage, StorageError};
use crate::text::{collapse_whitespace, preview, truncate_chars};

pub mod handlers;

const PREVIEW_CHARS: usize = 500;

/// Stable, caller-visible failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    AcquisitionError,
    ExtractionError,
    UnsupportedFormat,
    InsufficientContent,
    StorageError,
    PersistenceError,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::AcquisitionError => "ACQUISITION_ERROR",
            ErrorKind::ExtractionError => "EXTRACTION_ERROR",
            ErrorKind::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            ErrorKind::InsufficientContent => "INSUFFICIENT_CONTENT",
            ErrorKind::StorageError => "STORAGE_ERROR",
            ErrorKind::PersistenceError => "PERSISTENCE_ERROR",
        }
    }

    /// Which pipeline stage a failure belongs to.
    pub fn stage(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation",
            ErrorKind::AcquisitionError => "acquisition",
            ErrorKind::ExtractionError
            | ErrorKind::UnsupportedFormat
            | ErrorKind::InsufficientContent => "extraction",
            ErrorKind::StorageError => "storage",
            ErrorKind::PersistenceError => "persistence",
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0}")]
    Validation(String),

    #[error("access denied")]
    AccessDenied,

    #[error("{0}")]
    Acquisition(#[source] AcquisitionError),

    #[error("{0}")]
    Extraction(#[source] ExtractionError),

    #[error("{0}")]
    UnsupportedFormat(#[source] ExtractionError),

    #[error("{0}")]
    InsufficientContent(#[source] ExtractionError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Persistence(#[from] PersistenceError),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Validation(_) | IngestError::AccessDenied => ErrorKind::ValidationError,
            IngestError::Acquisition(_) => ErrorKind::AcquisitionError,
            IngestError::Extraction(_) => ErrorKind::ExtractionError,
            IngestError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            IngestError::InsufficientContent(_) => ErrorKind::InsufficientContent,
            IngestError::Storage(_) => ErrorKind::StorageError,
            IngestError::Persistence(_) => ErrorKind::PersistenceError,
        }
    }
}

impl From<ExtractionError> for IngestError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::UnsupportedFormat { .. } => IngestError::UnsupportedFormat(e),
            ExtractionError::InsufficientContent { .. } => IngestError::InsufficientContent(e),
            ExtractionError::Failed { .. } => IngestError::Extraction(e),
        }
    }
}

impl From<AcquisitionError> for IngestError {
    fn from(e: AcquisitionError) -> Self {
        match e {
            AcquisitionError::InvalidUrl { .. } => IngestError::Validation(e.to_string()),
            AcquisitionError::Exhausted { .. } => IngestError::Acquisition(e),
        }
    }
}

pub type PipelineResult<T> = Result<T, IngestError>;

/// Exactly one of URL or pasted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobInput {
    Url(String),
    Text(String),
}

impl JobInput {
    /// Blank strings count as absent.
    pub fn from_parts(url: Option<String>, text: Option<String>) -> PipelineResult<Self> {
        let url = url.filter(|u| !u.trim().is_empty());
        let text = text.filter(|t| !t.trim().is_empty());
        match (url, text) {
            (Some(url), None) => Ok(JobInput::Url(url)),
            (None, Some(text)) => Ok(JobInput::Text(text)),
            (Some(_), Some(_)) => Err(IngestError::Validation(
                "Provide either a job URL or job text, not both".to_string(),
            )),
            (None, None) => Err(IngestError::Validation(
                "No job content supplied: provide a job URL or job text".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentIngestion {
    pub record_id: Uuid,
    pub format: DocumentFormat,
    pub record: StructuredRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobIngestion {
    pub record_id: Uuid,
    /// The job text that was analysed (acquired or pasted, capped).
    pub analysis_text: String,
    pub truncated_preview: String,
    /// `None` for pasted text.
    pub strategy: Option<StrategyKind>,
    pub record: JobPostingRecord,
}

pub struct Pipeline {
    resolver: ContentResolver,
    extractor: DocumentExtractor,
    normalizer: Normalizer,
    storage: Arc<dyn BlobStorage>,
    store: Arc<dyn RecordStore>,
    max_content_chars: usize,
}

impl Pipeline {
    pub fn new(
        resolver: ContentResolver,
        extractor: DocumentExtractor,
        normalizer: Normalizer,
        storage: Arc<dyn BlobStorage>,
        store: Arc<dyn RecordStore>,
        max_content_chars: usize,
    ) -> Self {
        Self {
            resolver,
            extractor,
            normalizer,
            storage,
            store,
            max_content_chars,
        }
    }

    pub async fn ingest_document(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
    ) -> PipelineResult<DocumentIngestion> {
        self.run_document(owner_id, file_id).await.inspect_err(|e| {
            warn!("Document {file_id} ingestion failed at {}: {e}", e.kind().stage())
        })
    }

    async fn run_document(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
    ) -> PipelineResult<DocumentIngestion> {
        let document = self
            .store
            .find_document(file_id)
            .await?
            .ok_or_else(|| IngestError::Validation(format!("Document {file_id} not found")))?;

        if document.owner_id != owner_id {
            warn!("Owner {owner_id} attempted to ingest document {file_id} owned by someone else");
            return Err(IngestError::AccessDenied);
        }

        let bytes = self.storage.get(&document.bucket, &document.path).await?;
        let raw = RawDocument::new(bytes, document.original_name.clone())
            .with_content_type(document.content_type.clone());

        let extracted = self.extractor.extract(raw).await?;
        let record = self.normalizer.normalize_profile(&extracted.text).await;

        let record_id = self
            .store
            .save_structured_record(owner_id, &SourceRef::Document(file_id), &record)
            .await?;

        info!(
            "Ingested document {file_id} as record {record_id} (degraded: {})",
            record.is_degraded()
        );

        Ok(DocumentIngestion {
            record_id,
            format: extracted.format,
            record,
        })
    }

    pub async fn ingest_job_posting(
        &self,
        owner_id: Option<Uuid>,
        input: JobInput,
    ) -> PipelineResult<JobIngestion> {
        self.run_job_posting(owner_id, input)
            .await
            .inspect_err(|e| warn!("Job posting ingestion failed at {}: {e}", e.kind().stage()))
    }

    async fn run_job_posting(
        &self,
        owner_id: Option<Uuid>,
        input: JobInput,
    ) -> PipelineResult<JobIngestion> {
        let (analysis_text, strategy, source) = match input {
            JobInput::Url(url) => {
                let content = self.resolver.acquire(&url).await?;
                (content.text, Some(content.strategy), SourceRef::Url(content.url))
            }
            JobInput::Text(text) => {
                let mut text = collapse_whitespace(&text);
                if text.is_empty() {
                    return Err(IngestError::Validation("Job text is empty".to_string()));
                }
                truncate_chars(&mut text, self.max_content_chars);
                (text, None, SourceRef::PastedText)
            }
        };

        let record = self.normalizer.normalize_job_posting(&analysis_text).await;
        let record_id = self.store.save_job_posting(owner_id, &source, &record).await?;

        info!(
            "Ingested job posting from {} as {record_id} (degraded: {})",
            source.kind(),
            record.is_degraded()
        );

        Ok(JobIngestion {
            record_id,
            truncated_preview: preview(&analysis_text, PREVIEW_CHARS),
            analysis_text,
            strategy,
            record,
        })
    }
}

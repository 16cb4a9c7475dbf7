use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::JobInput;
use crate::acquisition::StrategyKind;
use crate::errors::AppError;
use crate::models::record::{JobPostingRecord, StructuredRecord};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DocumentIngestRequest {
    pub owner_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DocumentIngestResponse {
    pub success: bool,
    pub structured_record_id: Uuid,
    pub record: StructuredRecord,
}

#[derive(Debug, Deserialize)]
pub struct JobIngestRequest {
    pub url: Option<String>,
    pub text: Option<String>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct JobIngestResponse {
    pub success: bool,
    pub record_id: Uuid,
    pub analysis_text: String,
    pub truncated_preview: String,
    /// `null` for pasted text.
    pub strategy: Option<StrategyKind>,
    pub record: JobPostingRecord,
}

/// POST /api/v1/documents/:file_id/ingest
pub async fn handle_ingest_document(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
    body: Result<Json<DocumentIngestRequest>, JsonRejection>,
) -> Result<Json<DocumentIngestResponse>, AppError> {
    let Json(req) = body?;
    let ingestion = state.pipeline.ingest_document(req.owner_id, file_id).await?;
    Ok(Json(DocumentIngestResponse {
        success: true,
        structured_record_id: ingestion.record_id,
        record: ingestion.record,
    }))
}

/// POST /api/v1/jobs/ingest
pub async fn handle_ingest_job(
    State(state): State<AppState>,
    body: Result<Json<JobIngestRequest>, JsonRejection>,
) -> Result<Json<JobIngestResponse>, AppError> {
    let Json(req) = body?;
    let input = JobInput::from_parts(req.url, req.text)?;
    let ingestion = state.pipeline.ingest_job_posting(req.owner_id, input).await?;
    Ok(Json(JobIngestResponse {
        success: true,
        record_id: ingestion.record_id,
        analysis_text: ingestion.analysis_text,
        truncated_preview: ingestion.truncated_preview,
        strategy: ingestion.strategy,
        record: ingestion.record,
    }))
}

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pipeline::{ErrorKind, IngestError};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "Expected a JSON request body (content-type: application/json)"
            }
            _ => "Request body is not valid JSON for this endpoint",
        };
        AppError::Validation(message.to_string())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<&'static str>) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorKind::ValidationError.code(),
                msg.clone(),
                Some(ErrorKind::ValidationError.stage()),
            ),
            AppError::Ingest(e) => {
                let kind = e.kind();
                let status = match (e, kind) {
                    (IngestError::AccessDenied, _) => StatusCode::FORBIDDEN,
                    (_, ErrorKind::ValidationError) => StatusCode::BAD_REQUEST,
                    (_, ErrorKind::UnsupportedFormat) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    (_, ErrorKind::InsufficientContent | ErrorKind::ExtractionError) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    (_, ErrorKind::AcquisitionError) => StatusCode::BAD_GATEWAY,
                    (_, ErrorKind::StorageError | ErrorKind::PersistenceError) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                // Stage errors display client-safe text; diagnostics stay in the source chain.
                let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!("{} failure: {e}", kind.stage());
                    "An internal error occurred while processing the request".to_string()
                } else {
                    e.to_string()
                };
                (status, kind.code(), message, Some(kind.stage()))
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, stage) = self.parts();

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(stage) = stage {
            error["stage"] = json!(stage);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

//! PDF text-layer extraction via `pdf-extract`.
//!
//! The extractor wants a file path, so the buffer is written to a named temp
//! file first. The temp file is owned by the blocking task: it is removed when
//! that task ends, whether extraction succeeded, failed, panicked, or the
//! awaiting request was dropped.

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use super::{DocumentFormat, ExtractionError};

pub async fn extract_pdf(
    bytes: Bytes,
    temp_dir: Option<PathBuf>,
) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_pdf_blocking(&bytes, temp_dir.as_deref()))
        .await
        .map_err(|e| {
            ExtractionError::failed(DocumentFormat::Pdf, format!("PDF parser aborted: {e}"))
        })?
}

fn extract_pdf_blocking(bytes: &[u8], temp_dir: Option<&Path>) -> Result<String, ExtractionError> {
    let fail = |detail: String| ExtractionError::failed(DocumentFormat::Pdf, detail);

    let mut builder = tempfile::Builder::new();
    builder.prefix("resume-").suffix(".pdf");
    let mut tmp = match temp_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| fail(format!("temp file: {e}")))?;

    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| fail(format!("temp file write: {e}")))?;

    debug!("Extracting PDF text from {}", tmp.path().display());
    let text = pdf_extract::extract_text(tmp.path()).map_err(|e| fail(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(fail(
            "no text layer found (zero pages, or a scanned/image-only PDF)".to_string(),
        ));
    }

    Ok(text)
}

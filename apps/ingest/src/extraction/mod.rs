//! Document Text Extraction: binary blob + declared filename → plain text.
//!
//! Dispatch is by extension only. Every strategy's output goes through the same
//! whitespace collapse and minimum-length check; a short result is a failure,
//! never a near-empty success.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::text::{char_len, collapse_whitespace};

pub mod pdf;
pub mod word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
    Txt,
}

impl DocumentFormat {
    /// Case-insensitive lookup by file extension.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "doc" => Ok(DocumentFormat::Doc),
            "txt" => Ok(DocumentFormat::Txt),
            _ => Err(ExtractionError::UnsupportedFormat { extension }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Doc => "doc",
            DocumentFormat::Txt => "txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::Doc => "application/msword",
            DocumentFormat::Txt => "text/plain",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uploaded bytes plus what the uploader claimed they are.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Bytes,
    pub filename: String,
    pub content_type: Option<String>,
}

impl RawDocument {
    pub fn new(bytes: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedText {
    pub text: String,
    pub format: DocumentFormat,
    /// Size of the blob the text came from.
    pub source_bytes: usize,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file format '{extension}'. Supported formats: pdf, docx, doc, txt")]
    UnsupportedFormat { extension: String },

    /// `detail` carries parser diagnostics for logs; it is not part of the message.
    #[error("Failed to extract text from {format} document")]
    Failed {
        format: DocumentFormat,
        detail: String,
    },

    #[error("Document contains too little text ({chars} characters, minimum {min})")]
    InsufficientContent { chars: usize, min: usize },
}

impl ExtractionError {
    pub(crate) fn failed(format: DocumentFormat, detail: impl Into<String>) -> Self {
        ExtractionError::Failed {
            format,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    min_content_chars: usize,
}

impl DocumentExtractor {
    pub fn new(min_content_chars: usize) -> Self {
        Self { min_content_chars }
    }

    pub async fn extract(&self, document: RawDocument) -> Result<ExtractedText, ExtractionError> {
        let format = DocumentFormat::from_filename(&document.filename)?;
        let source_bytes = document.size();

        if let Some(declared) = document.content_type.as_deref() {
            if !declared_type_matches(declared, format) {
                warn!(
                    "'{}' declared as {declared} but extracting as {format} ({})",
                    document.filename,
                    format.mime_type()
                );
            }
        }

        let raw = match format {
            DocumentFormat::Pdf => pdf::extract_pdf(document.bytes, None).await,
            DocumentFormat::Docx => word::extract_docx(&document.bytes),
            DocumentFormat::Doc => word::extract_doc(&document.bytes),
            DocumentFormat::Txt => decode_plain_text(&document.bytes),
        }
        .inspect_err(|e| match e {
            ExtractionError::Failed { detail, .. } => {
                warn!("Extraction of '{}' failed: {e}: {detail}", document.filename)
            }
            _ => warn!("Extraction of '{}' failed: {e}", document.filename),
        })?;

        let text = collapse_whitespace(&raw);
        let chars = char_len(&text);
        if chars < self.min_content_chars {
            warn!(
                "Extraction of '{}' produced {chars} chars (< {})",
                document.filename, self.min_content_chars
            );
            return Err(ExtractionError::InsufficientContent {
                chars,
                min: self.min_content_chars,
            });
        }

        info!(
            "Extracted {chars} chars from {format} document '{}' ({source_bytes} bytes)",
            document.filename
        );

        Ok(ExtractedText {
            text,
            format,
            source_bytes,
        })
    }
}

/// Generic or missing media types never count as a mismatch.
fn declared_type_matches(declared: &str, format: DocumentFormat) -> bool {
    let media_type = declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type.is_empty()
        || media_type == "application/octet-stream"
        || media_type == format.mime_type()
}

fn decode_plain_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).map(str::to_string).map_err(|e| {
        ExtractionError::failed(DocumentFormat::Txt, format!("unsupported encoding: {e}"))
    })
}

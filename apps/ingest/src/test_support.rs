// Shared doubles for unit tests: a local HTML server, DOCX/PDF builders,
// a scripted text generator, and in-memory storage/persistence.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use chrono::Utc;
use url::Url;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::acquisition::{
    AcquisitionStrategy, ContentResolver, FetchScrapeStrategy, StrategyError, StrategyKind,
};
use crate::config::PipelineLimits;
use crate::extraction::DocumentExtractor;
use crate::llm_client::{GenerationRequest, LlmError, TextGenerator};
use crate::models::document::StoredDocument;
use crate::models::record::{JobPostingRecord, StructuredRecord};
use crate::normalizer::Normalizer;
use crate::persistence::{PersistenceError, RecordStore, SourceRef};
use crate::pipeline::Pipeline;
use crate::storage::{BlobStorage, StorageError};

pub const TEST_BUCKET: &str = "uploads";

// ─── HTTP ────────────────────────────────────────────────────────────────────

/// Serves fixed HTML pages on an ephemeral local port; returns `http://host:port`.
pub async fn spawn_html_server(pages: Vec<(&'static str, u16, String)>) -> String {
    let mut router = Router::new();
    for (path, status, body) in pages {
        let status = StatusCode::from_u16(status).unwrap();
        router = router.route(path, get(move || async move { (status, Html(body)) }));
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// Minimal WordprocessingML package with one paragraph per entry.
pub fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| {
            format!(
                r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                xml_escape(p)
            )
        })
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer
        .write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
        .unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(document.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Single-page PDF with one Helvetica text line and a correct xref table.
pub fn minimal_pdf(text: &str) -> Vec<u8> {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)");
    let content = format!("BT /F1 12 Tf 72 720 Td ({escaped}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_at = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ─── Text generation ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub system: String,
    pub user_text: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Returns a fixed reply (or a fixed failure) and records the last request.
pub struct ScriptedGenerator {
    reply: Option<String>,
    last: Mutex<Option<SeenRequest>>,
}

impl ScriptedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            last: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            last: Mutex::new(None),
        }
    }

    pub fn last_request(&self) -> Option<SeenRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, LlmError> {
        *self.last.lock().unwrap() = Some(SeenRequest {
            system: request.system.to_string(),
            user_text: request.user_text.to_string(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        });
        self.reply.clone().ok_or(LlmError::Api {
            status: 529,
            message: "overloaded".to_string(),
        })
    }
}

// ─── Acquisition ─────────────────────────────────────────────────────────────

/// Stands in for the headless renderer on machines without a browser.
pub struct UnavailableRenderer;

#[async_trait]
impl AcquisitionStrategy for UnavailableRenderer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Rendered
    }

    async fn attempt(&self, _url: &Url) -> Result<String, StrategyError> {
        Err(StrategyError::Unavailable("no browser in tests".to_string()))
    }
}

// ─── Storage / persistence ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<(String, String), Bytes>>,
}

impl InMemoryStorage {
    pub fn clear(&self) {
        self.objects.lock().unwrap().clear();
    }
}

#[async_trait]
impl BlobStorage for InMemoryStorage {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), path.to_string()), bytes);
        Ok(format!("mem://{bucket}/{path}"))
    }

    async fn get(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            })
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), path.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRecordStore {
    documents: Mutex<HashMap<Uuid, StoredDocument>>,
    structured: Mutex<Vec<(Uuid, Uuid, StructuredRecord)>>,
    job_postings: Mutex<Vec<(Uuid, Option<Uuid>, JobPostingRecord)>>,
}

impl InMemoryRecordStore {
    /// Uploads `bytes` to `storage` and registers the document row.
    pub async fn seed_document(
        &self,
        storage: &InMemoryStorage,
        owner_id: Uuid,
        original_name: &str,
        bytes: Vec<u8>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let path = crate::storage::object_path(owner_id, "resumes", id, original_name);
        let size_bytes = bytes.len() as i64;
        storage
            .put(TEST_BUCKET, &path, Bytes::from(bytes), "application/octet-stream")
            .await
            .unwrap();

        self.documents.lock().unwrap().insert(
            id,
            StoredDocument {
                id,
                owner_id,
                bucket: TEST_BUCKET.to_string(),
                path,
                original_name: original_name.to_string(),
                content_type: None,
                size_bytes,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn structured_count(&self) -> usize {
        self.structured.lock().unwrap().len()
    }

    pub fn job_posting_count(&self) -> usize {
        self.job_postings.lock().unwrap().len()
    }

    pub fn saved_record(&self, id: Uuid) -> Option<StructuredRecord> {
        self.structured
            .lock()
            .unwrap()
            .iter()
            .find(|(record_id, _, _)| *record_id == id)
            .map(|(_, _, record)| record.clone())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_document(
        &self,
        file_id: Uuid,
    ) -> Result<Option<StoredDocument>, PersistenceError> {
        Ok(self.documents.lock().unwrap().get(&file_id).cloned())
    }

    async fn save_structured_record(
        &self,
        owner_id: Uuid,
        _source: &SourceRef,
        record: &StructuredRecord,
    ) -> Result<Uuid, PersistenceError> {
        let id = Uuid::new_v4();
        self.structured
            .lock()
            .unwrap()
            .push((id, owner_id, record.clone()));
        Ok(id)
    }

    async fn save_job_posting(
        &self,
        owner_id: Option<Uuid>,
        _source: &SourceRef,
        record: &JobPostingRecord,
    ) -> Result<Uuid, PersistenceError> {
        let id = Uuid::new_v4();
        self.job_postings
            .lock()
            .unwrap()
            .push((id, owner_id, record.clone()));
        Ok(id)
    }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Default limits, no browser: acquisition goes straight to fetch + scrape.
pub fn test_pipeline(
    generator: ScriptedGenerator,
    storage: Arc<InMemoryStorage>,
    store: Arc<InMemoryRecordStore>,
) -> Pipeline {
    let limits = PipelineLimits::default();
    let scraper =
        FetchScrapeStrategy::new(limits.fetch_timeout, limits.selector_min_chars).unwrap();
    let resolver = ContentResolver::new(
        vec![Box::new(UnavailableRenderer), Box::new(scraper)],
        limits.max_content_chars,
    );
    Pipeline::new(
        resolver,
        DocumentExtractor::new(limits.min_content_chars),
        Normalizer::new(Arc::new(generator), &limits),
        storage,
        store,
        limits.max_content_chars,
    )
}

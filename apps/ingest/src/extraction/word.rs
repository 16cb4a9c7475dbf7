//! Word document raw-text extraction, entirely in memory.
//!
//! DOCX: read `word/document.xml` out of the OOXML zip and keep the text runs.
//! DOC: OOXML packages saved with a `.doc` name take the DOCX path; genuine
//! Word 97-2003 binaries are scanned for printable text runs.

use std::io::{Cursor, Read};
use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::{DocumentFormat, ExtractionError};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const MIN_RUN_CHARS: usize = 4;

fn run_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab\s*/>|<w:(?:br|cr)(?:\s[^>]*)?/>|</w:p>")
            .expect("static regex")
    })
}

fn entity_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("static regex")
    })
}

pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    ooxml_text(bytes, DocumentFormat::Docx)
}

pub fn extract_doc(bytes: &[u8]) -> Result<String, ExtractionError> {
    if bytes.starts_with(ZIP_MAGIC) {
        return ooxml_text(bytes, DocumentFormat::Doc);
    }
    if !bytes.starts_with(CFB_MAGIC) {
        return Err(ExtractionError::failed(
            DocumentFormat::Doc,
            "not a Word document (unrecognized file signature)",
        ));
    }

    let text = match utf16_runs(bytes) {
        runs if !runs.trim().is_empty() => runs,
        _ => ascii_runs(bytes),
    };
    if text.trim().is_empty() {
        return Err(ExtractionError::failed(
            DocumentFormat::Doc,
            "no readable text found in legacy Word document",
        ));
    }
    Ok(text)
}

fn ooxml_text(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::failed(format, format!("invalid archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::failed(format, format!("missing word/document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::failed(format, format!("unreadable document body: {e}")))?;

    Ok(document_xml_text(&xml))
}

/// Text of `<w:t>` runs with tabs, breaks and paragraph ends preserved.
fn document_xml_text(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() / 4);
    for caps in run_pattern().captures_iter(xml) {
        if let Some(run) = caps.get(1) {
            out.push_str(&decode_entities(run.as_str()));
            continue;
        }
        let tag = caps.get(0).map_or("", |m| m.as_str());
        if tag.starts_with("<w:tab") {
            out.push('\t');
        } else {
            out.push('\n');
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    entity_pattern()
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if entity.starts_with("#x") => u32::from_str_radix(&entity[2..], 16)
                    .ok()
                    .and_then(char::from_u32),
                _ => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn is_text_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
        || (!c.is_control() && (c < '\u{0250}' || ('\u{2010}'..='\u{205F}').contains(&c)))
}

/// Word 97+ stores most text as UTF-16LE.
fn utf16_runs(bytes: &[u8]) -> String {
    let mut runs = Vec::new();
    let mut current = String::new();
    for pair in bytes.chunks_exact(2) {
        let unit = u16::from_le_bytes([pair[0], pair[1]]);
        match char::from_u32(u32::from(unit)) {
            Some(c) if is_text_char(c) => current.push(c),
            _ => flush_run(&mut current, &mut runs),
        }
    }
    flush_run(&mut current, &mut runs);
    runs.join("\n")
}

/// Fallback for documents saved with 8-bit text pieces.
fn ascii_runs(bytes: &[u8]) -> String {
    let mut runs = Vec::new();
    let mut current = String::new();
    for &b in bytes {
        if b.is_ascii_graphic() || matches!(b, b' ' | b'\t' | b'\r' | b'\n') {
            current.push(char::from(b));
        } else {
            flush_run(&mut current, &mut runs);
        }
    }
    flush_run(&mut current, &mut runs);
    runs.join("\n")
}

fn flush_run(current: &mut String, runs: &mut Vec<String>) {
    let trimmed = current.trim();
    if trimmed.chars().filter(|c| c.is_alphanumeric()).count() >= MIN_RUN_CHARS {
        runs.push(trimmed.to_string());
    }
    current.clear();
}

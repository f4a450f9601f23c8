//! lopdf-based extraction of page text and info-dictionary metadata.

use async_trait::async_trait;
use lopdf::{Document, Object};
use std::path::Path;
use tracing::{debug, info};

use crate::metadata::{self, PaperMetadata};
use crate::{DocumentExtractor, ExtractError, ExtractedText, Result};

/// Extractor backed by lopdf. Parsing runs on the blocking pool since
/// lopdf is synchronous.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract_text(&self, path: &Path) -> Result<ExtractedText> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_text_blocking(&path)).await?
    }

    async fn extract_metadata(&self, path: &Path) -> Result<PaperMetadata> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_metadata_blocking(&path)).await?
    }
}

fn load_document(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(ExtractError::FileNotFound(path.to_path_buf()));
    }
    Ok(Document::load(path)?)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

fn extract_text_blocking(path: &Path) -> Result<ExtractedText> {
    let doc = load_document(path)?;
    let pages = doc.get_pages();
    let page_count = pages.len();

    let mut full_text = String::new();
    for (&page_no, _) in &pages {
        let page_text = match doc.extract_text(&[page_no]) {
            Ok(t) => t,
            Err(e) => {
                debug!(page = page_no, error = %e, "Page text extraction failed, skipping page");
                String::new()
            }
        };
        full_text.push_str(&format!("--- Page {} ---\n{}\n\n", page_no, page_text));
    }

    let text = full_text.trim().to_string();
    info!(
        file = %file_name_of(path),
        pages = page_count,
        chars = text.len(),
        "PDF parsed"
    );

    Ok(ExtractedText {
        text,
        page_count,
        file_name: file_name_of(path),
    })
}

fn extract_metadata_blocking(path: &Path) -> Result<PaperMetadata> {
    let doc = load_document(path)?;

    let info = read_info_dictionary(&doc);
    let title = info.as_ref().and_then(|i| non_empty(i.title.clone()));
    let authors = info.as_ref().and_then(|i| non_empty(i.author.clone()));
    let abstract_text = info.as_ref().and_then(|i| non_empty(i.subject.clone()));

    // Info dictionary incomplete → fall back to heuristics over the text.
    let (title, authors, abstract_text, year) = if title.is_none() || abstract_text.is_none() {
        debug!(file = %file_name_of(path), "Info dictionary incomplete, applying text heuristics");
        let text = extract_text_blocking(path)?.text;
        let heuristic = metadata::extract_heuristic(&text);
        (
            title.unwrap_or(heuristic.title),
            authors.unwrap_or(heuristic.authors),
            abstract_text.unwrap_or(heuristic.abstract_text),
            heuristic.year,
        )
    } else {
        let year = info
            .as_ref()
            .and_then(|i| i.creation_date.as_deref())
            .and_then(metadata::year_in);
        (
            title.unwrap_or_else(|| metadata::UNKNOWN_TITLE.to_string()),
            authors.unwrap_or_else(|| metadata::UNKNOWN_AUTHORS.to_string()),
            abstract_text.unwrap_or_else(|| metadata::NO_ABSTRACT.to_string()),
            year,
        )
    };

    info!(file = %file_name_of(path), title = %title, "Metadata extracted");

    Ok(PaperMetadata {
        title,
        authors,
        abstract_text,
        year,
    })
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

struct InfoDictionary {
    title: Option<String>,
    author: Option<String>,
    subject: Option<String>,
    creation_date: Option<String>,
}

/// Read Title/Author/Subject/CreationDate from the trailer Info dictionary.
fn read_info_dictionary(doc: &Document) -> Option<InfoDictionary> {
    let info_obj = doc.trailer.get(b"Info").ok()?;
    let dict = match info_obj {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?,
        Object::Dictionary(d) => d,
        _ => return None,
    };

    let field = |key: &[u8]| -> Option<String> {
        match dict.get(key).ok()? {
            Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
            _ => None,
        }
    };

    Some(InfoDictionary {
        title: field(b"Title"),
        author: field(b"Author"),
        subject: field(b"Subject"),
        creation_date: field(b"CreationDate"),
    })
}

/// PDF text strings are either UTF-16BE with a BOM or PDFDocEncoding
/// (treated as latin-adjacent, decoded lossily).
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).to_string()
    }
}

//! Text extraction for uploaded documents.
//!
//! PDFs are extracted page by page so chunks keep their 1-based page
//! number; plain text has no page structure and loads as a single
//! unpaged entry.

use tracing::debug;

use hayrick_core::{Error, Result};

use crate::chunker::PageText;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Map a multipart content type to a supported format.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        // Charset suffixes ("text/plain; charset=utf-8") are ignored.
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "application/pdf" => Some(Self::Pdf),
            "text/plain" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// The content types `/ingest` accepts, for error messages.
    pub fn allowed() -> &'static [&'static str] {
        &["application/pdf", "text/plain"]
    }
}

/// Extract per-page text from an uploaded document.
pub fn load_pages(kind: DocumentKind, bytes: &[u8]) -> Result<Vec<PageText>> {
    match kind {
        DocumentKind::PlainText => load_plain_text(bytes),
        DocumentKind::Pdf => load_pdf(bytes),
    }
}

fn load_plain_text(bytes: &[u8]) -> Result<Vec<PageText>> {
    let text = String::from_utf8_lossy(bytes).into_owned();
    if text.trim().is_empty() {
        return Err(Error::Validation("uploaded file contains no text".into()));
    }
    Ok(vec![PageText { page: None, text }])
}

fn load_pdf(bytes: &[u8]) -> Result<Vec<PageText>> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| Error::Validation(format!("could not parse PDF: {}", e)))?;

    let mut pages = Vec::new();
    for (page_number, _) in document.get_pages() {
        let text = match document.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                debug!("Skipping unreadable page {}: {}", page_number, e);
                continue;
            }
        };
        let text = text.trim().to_string();
        if text.is_empty() {
            continue;
        }
        pages.push(PageText {
            page: Some(page_number),
            text,
        });
    }

    if pages.is_empty() {
        return Err(Error::Validation("no readable text found in PDF".into()));
    }
    Ok(pages)
}

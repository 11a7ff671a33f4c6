//! Fixed-window chunking over per-page text.
//!
//! Tokenization is whitespace-based. Each page is windowed
//! independently (so a chunk never straddles a page boundary), but
//! `chunk_id` runs monotonically from 0 across the whole document —
//! dense, contiguous numbering is what neighbor expansion relies on.

use hayrick_core::{Error, Result};

/// Window size in whitespace tokens.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Token overlap carried into the next window on the same page.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// One page of already-parsed text, in reading order.
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number; None for unpaged formats.
    pub page: Option<u32>,
    pub text: String,
}

/// One emitted chunk with its document-wide id.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    pub chunk_id: u32,
    pub page: Option<u32>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        // DEFAULT_CHUNK_OVERLAP < DEFAULT_CHUNK_SIZE, so this cannot fail.
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP).unwrap()
    }
}

impl Chunker {
    /// `overlap` must be strictly smaller than `chunk_size`, otherwise
    /// the window step would be zero or negative.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Validation("chunk_size must be positive".into()));
        }
        if overlap >= chunk_size {
            return Err(Error::Validation(
                "overlap must be smaller than chunk_size".into(),
            ));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Chunk all pages in reading order. Pages with no tokens emit
    /// nothing but do not break the numbering.
    pub fn chunk_pages(&self, pages: &[PageText]) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();

        for page in pages {
            let tokens: Vec<&str> = page.text.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }

            let step = self.chunk_size - self.overlap;
            let mut start = 0;
            while start < tokens.len() {
                let end = (start + self.chunk_size).min(tokens.len());
                chunks.push(DocumentChunk {
                    chunk_id: chunks.len() as u32,
                    page: page.page,
                    text: tokens[start..end].join(" "),
                });
                start += step;
            }
        }

        chunks
    }
}

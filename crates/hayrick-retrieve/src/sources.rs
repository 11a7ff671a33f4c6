//! Citation assembly from the ranked evidence set.

use std::collections::HashSet;

use hayrick_core::Source;

use crate::stages::RetrievedChunk;

const SNIPPET_CHARS: usize = 200;

/// Walk the evidence set in ranked order and emit up to `limit`
/// citations, one per distinct `(document_id, chunk_id)`.
pub fn assemble_sources(chunks: &[RetrievedChunk], limit: usize) -> Vec<Source> {
    let mut seen: HashSet<(String, u32)> = HashSet::new();
    let mut sources = Vec::new();

    for retrieved in chunks {
        let key = (
            retrieved.chunk.document_id.clone(),
            retrieved.chunk.chunk_id,
        );
        if !seen.insert(key) {
            continue;
        }

        sources.push(Source {
            document_id: retrieved.chunk.document_id.clone(),
            chunk_id: retrieved.chunk.chunk_id.to_string(),
            source: Some(retrieved.chunk.source.clone()).filter(|s| !s.is_empty()),
            page: retrieved.chunk.page,
            snippet: snippet(&retrieved.chunk.text),
        });

        if sources.len() >= limit {
            break;
        }
    }

    sources
}

/// First 200 characters of the chunk text, None when empty.
fn snippet(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(SNIPPET_CHARS).collect())
}

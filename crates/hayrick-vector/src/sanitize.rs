//! Metadata flattening for the vector store.
//!
//! The store rejects non-scalar metadata values: no nulls, lists or
//! maps. `tags` is therefore comma-joined on write and split on read;
//! absent optional fields are dropped rather than written as null. The
//! BM25 index keeps the richer list shape.

use serde_json::{Map, Value};

use hayrick_core::ChunkRecord;

/// Flatten a chunk's metadata to the scalar-only shape the store accepts.
pub fn flatten_metadata(chunk: &ChunkRecord) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert(
        "document_id".into(),
        Value::String(chunk.document_id.trim().to_string()),
    );
    // Numeric chunk_id is kept for neighbor math on read.
    meta.insert("chunk_id".into(), Value::from(chunk.chunk_id));
    meta.insert("source".into(), Value::String(chunk.source.clone()));

    if let Some(page) = chunk.page {
        meta.insert("page".into(), Value::from(page));
    }
    if !chunk.tags.is_empty() {
        meta.insert("tags".into(), Value::String(chunk.tags.join(",")));
    }

    meta
}

/// Rebuild a [`ChunkRecord`] from a stored document + metadata pair.
/// Returns None when the metadata is missing the identity fields.
pub fn record_from_parts(
    text: Option<String>,
    metadata: Option<Map<String, Value>>,
    embedding: Option<Vec<f32>>,
) -> Option<ChunkRecord> {
    let meta = metadata?;
    let document_id = meta.get("document_id")?.as_str()?.to_string();
    let chunk_id = meta.get("chunk_id")?.as_u64()? as u32;

    let source = meta
        .get("source")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let page = meta.get("page").and_then(|v| v.as_u64()).map(|p| p as u32);
    let tags = meta
        .get("tags")
        .and_then(|v| v.as_str())
        .map(split_tags)
        .unwrap_or_default();

    Some(ChunkRecord {
        document_id,
        chunk_id,
        text: text.unwrap_or_default(),
        page,
        source,
        tags,
        embedding,
    })
}

fn split_tags(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

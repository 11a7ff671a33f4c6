//! Shared chunk schema and the deterministic chunk addressing scheme.
//!
//! Every chunk is keyed by `{document_id}::{chunk_id}` in the vector
//! store. Neighbor expansion derives ids from `chunk_id` arithmetic, so
//! the key format is load-bearing: it is constructed identically at
//! ingest and query time and must never be replaced by store-generated
//! ids.

use serde::{Deserialize, Serialize};

/// Build the physical vector-store id for a chunk.
/// The `document_id` is trimmed so ids stay consistent across services.
pub fn chunk_key(document_id: &str, chunk_id: u32) -> String {
    format!("{}::{}", document_id.trim(), chunk_id)
}

/// Split a physical id back into `(document_id, chunk_id)`.
/// Returns None for ids that were not produced by [`chunk_key`].
pub fn parse_chunk_key(key: &str) -> Option<(String, u32)> {
    let (doc, chunk) = key.rsplit_once("::")?;
    if doc.is_empty() {
        return None;
    }
    let chunk_id = chunk.parse().ok()?;
    Some((doc.to_string(), chunk_id))
}

/// The atomic retrieval unit, as it exists in both stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub document_id: String,
    pub chunk_id: u32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub source: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Present on upsert and on fetches that include embeddings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl ChunkRecord {
    /// The deterministic vector-store id for this chunk.
    pub fn key(&self) -> String {
        chunk_key(&self.document_id, self.chunk_id)
    }
}

/// A chunk returned by approximate nearest-neighbor search, with its
/// cosine similarity to the query vector (`1 − distance`).
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: ChunkRecord,
    pub cosine: f32,
}

/// One BM25 hit from the search node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalHit {
    pub document_id: String,
    pub chunk_id: u32,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub score: f32,
}

/// Body of the search node's `POST /index` operation — one chunk to add
/// to the BM25 index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexChunkRequest {
    pub document_id: String,
    pub chunk_id: u32,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A ranked citation in a query answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub document_id: String,
    /// Stringly typed on the wire; numeric inside the engine.
    pub chunk_id: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Final answer payload for `POST /query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub answer: String,
    pub sources: Vec<Source>,
    /// Characters of context actually sent to the model.
    pub context_used: usize,
    pub model_used: String,
}

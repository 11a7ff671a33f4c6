//! Trait seams between the retrieval engine and its remote
//! collaborators. Concrete implementations live in `hayrick-embed`,
//! `hayrick-vector` and `hayrick-lexical`; tests substitute in-memory
//! fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::{ChunkRecord, IndexChunkRequest, LexicalHit, ScoredChunk};

/// Produces query and chunk embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, preserving order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text (queries).
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let mut vectors = self.embed(&texts).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::Error::Embedding("empty embedding response".into()))
    }
}

/// The vector store operations the core depends on.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Write chunks keyed by their deterministic ids. Each chunk must
    /// carry an embedding.
    async fn upsert(&self, chunks: &[ChunkRecord]) -> Result<()>;

    /// Batch fetch by deterministic id; ids not present are omitted.
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<ChunkRecord>>;

    /// Approximate nearest-neighbor search under cosine distance,
    /// optionally restricted to one document.
    async fn query_by_vector(
        &self,
        vector: &[f32],
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<Vec<ScoredChunk>>;

    /// All chunks whose metadata field equals the given value.
    async fn get_where(&self, field: &str, value: &str) -> Result<Vec<ChunkRecord>>;
}

/// The search node's BM25 surface as seen by the other services.
#[async_trait]
pub trait LexicalIndex: Send + Sync {
    /// Add one chunk to the BM25 index.
    async fn index_chunk(&self, chunk: &IndexChunkRequest) -> Result<()>;

    /// BM25 search, best hits first.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<LexicalHit>>;
}

//! The async retrieval pipeline over the store seams.
//!
//! Query embedding and the BM25 candidate pull are independent and run
//! concurrently; everything after them is data-dependent and
//! sequential. A BM25 outage (or an empty hit set) degrades to
//! full-corpus vector search rather than failing the request.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use hayrick_core::{chunk_key, Embedder, LexicalIndex, Result, ScoredChunk, VectorIndex};

use crate::params::HybridParams;
use crate::stages::{
    fuse_candidates, neighbor_keys, rank_expansion, select_centers, RetrievedChunk,
};

/// Which path produced the evidence set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Vector search restricted to one document; no neighbor expansion.
    Restricted,
    /// The full BM25 → fusion → centers → neighbors pipeline.
    Hybrid,
    /// Full-corpus vector search because BM25 produced nothing usable.
    VectorFallback,
}

/// The ranked evidence set for one question.
#[derive(Debug)]
pub struct Retrieval {
    pub chunks: Vec<RetrievedChunk>,
    pub mode: RetrievalMode,
}

pub struct HybridRetriever {
    embedder: Arc<dyn Embedder>,
    vectors: Arc<dyn VectorIndex>,
    lexical: Arc<dyn LexicalIndex>,
    params: HybridParams,
}

impl HybridRetriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorIndex>,
        lexical: Arc<dyn LexicalIndex>,
        params: HybridParams,
    ) -> Self {
        Self {
            embedder,
            vectors,
            lexical,
            params,
        }
    }

    /// Run the retrieval pipeline for one question.
    pub async fn retrieve(
        &self,
        question: &str,
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<Retrieval> {
        // Restricted path: the document filter already narrows the
        // search, so plain vector ranking inside the document is enough.
        if let Some(doc) = document_id {
            let query = self.embedder.embed_one(question).await?;
            let scored = self.vectors.query_by_vector(&query, top_k, Some(doc)).await?;
            return Ok(Retrieval {
                chunks: scored_to_chunks(scored),
                mode: RetrievalMode::Restricted,
            });
        }

        // Embed and BM25 pull are independent; fire both at once.
        let (query, hits) = tokio::join!(
            self.embedder.embed_one(question),
            self.lexical.search(question, self.params.bm25_chunks),
        );
        let query = query?;
        let hits = match hits {
            Ok(hits) => hits,
            Err(e) => {
                warn!("BM25 search failed, falling back to vector search: {}", e);
                Vec::new()
            }
        };

        if hits.is_empty() {
            return self.vector_fallback(&query, top_k).await;
        }
        info!(hits = hits.len(), "BM25 candidates");

        // Deterministic center ids, deduped in rank order; the score map
        // keeps the best BM25 score per chunk.
        let mut seen = HashSet::new();
        let mut center_ids = Vec::new();
        let mut bm25_by_key: HashMap<String, f32> = HashMap::new();
        for hit in &hits {
            let key = chunk_key(&hit.document_id, hit.chunk_id);
            bm25_by_key.entry(key.clone()).or_insert(hit.score);
            if seen.insert(key.clone()) {
                center_ids.push(key);
            }
        }

        // BM25 and the vector store may be transiently inconsistent;
        // ids that do not resolve are simply dropped.
        let fetched = self.vectors.get_by_ids(&center_ids).await?;
        if fetched.is_empty() {
            warn!("No BM25 candidate resolved in the vector store");
            return self.vector_fallback(&query, top_k).await;
        }

        let candidates =
            fuse_candidates(fetched, &query, &bm25_by_key, self.params.fusion_alpha);
        if candidates.is_empty() {
            return self.vector_fallback(&query, top_k).await;
        }

        let bm25_top = hits
            .first()
            .map(|h| (h.document_id.trim(), h.chunk_id));
        let centers = select_centers(
            &candidates,
            self.params.center_rel_threshold,
            self.params.center_k,
            bm25_top,
        );
        info!(
            centers = ?centers
                .iter()
                .map(|c| (c.chunk.document_id.as_str(), c.chunk.chunk_id))
                .collect::<Vec<_>>(),
            "Selected centers"
        );

        let mut wanted = HashSet::new();
        let mut neighbor_ids = Vec::new();
        for center in &centers {
            for key in neighbor_keys(
                &center.chunk.document_id,
                center.chunk.chunk_id,
                self.params.neighbor_window,
            ) {
                if wanted.insert(key.clone()) {
                    neighbor_ids.push(key);
                }
            }
        }
        let neighborhood = self.vectors.get_by_ids(&neighbor_ids).await?;

        let chunks = rank_expansion(
            &centers,
            &neighborhood,
            self.params.neighbor_window,
            self.params.distance_penalty,
            self.params.max_context_chunks,
        );
        if chunks.is_empty() {
            return self.vector_fallback(&query, top_k).await;
        }

        Ok(Retrieval {
            chunks,
            mode: RetrievalMode::Hybrid,
        })
    }

    async fn vector_fallback(&self, query: &[f32], top_k: usize) -> Result<Retrieval> {
        let scored = self.vectors.query_by_vector(query, top_k, None).await?;
        Ok(Retrieval {
            chunks: scored_to_chunks(scored),
            mode: RetrievalMode::VectorFallback,
        })
    }
}

/// Vector-only results carry their cosine similarity as the evidence
/// score; each hit stands alone as its own center.
fn scored_to_chunks(scored: Vec<ScoredChunk>) -> Vec<RetrievedChunk> {
    scored
        .into_iter()
        .map(|s| RetrievedChunk {
            chunk: s.chunk,
            is_center: true,
            distance_from_center: 0,
            center_score: s.cosine,
            evidence_score: s.cosine,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use hayrick_core::{ChunkRecord, Error, IndexChunkRequest, LexicalHit};
    use std::cmp::Ordering;

    use crate::stages::cosine_similarity;

    struct FakeEmbedder {
        vector: Vec<f32>,
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.vector.clone()).collect())
        }
    }

    struct FakeVectors {
        chunks: Vec<ChunkRecord>,
    }

    #[async_trait]
    impl VectorIndex for FakeVectors {
        async fn upsert(&self, _chunks: &[ChunkRecord]) -> Result<()> {
            Ok(())
        }

        async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<ChunkRecord>> {
            Ok(self
                .chunks
                .iter()
                .filter(|c| ids.contains(&c.key()))
                .cloned()
                .collect())
        }

        async fn query_by_vector(
            &self,
            vector: &[f32],
            top_k: usize,
            document_id: Option<&str>,
        ) -> Result<Vec<ScoredChunk>> {
            let mut scored: Vec<ScoredChunk> = self
                .chunks
                .iter()
                .filter(|c| document_id.map_or(true, |d| c.document_id == d))
                .map(|c| ScoredChunk {
                    cosine: cosine_similarity(vector, c.embedding.as_deref().unwrap_or(&[])),
                    chunk: c.clone(),
                })
                .collect();
            scored.sort_by(|a, b| {
                b.cosine.partial_cmp(&a.cosine).unwrap_or(Ordering::Equal)
            });
            scored.truncate(top_k);
            Ok(scored)
        }

        async fn get_where(&self, field: &str, value: &str) -> Result<Vec<ChunkRecord>> {
            if field != "document_id" {
                return Ok(Vec::new());
            }
            Ok(self
                .chunks
                .iter()
                .filter(|c| c.document_id == value)
                .cloned()
                .collect())
        }
    }

    enum FakeLexical {
        Hits(Vec<LexicalHit>),
        Down,
    }

    #[async_trait]
    impl LexicalIndex for FakeLexical {
        async fn index_chunk(&self, _chunk: &IndexChunkRequest) -> Result<()> {
            Ok(())
        }

        async fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<LexicalHit>> {
            match self {
                FakeLexical::Hits(hits) => Ok(hits.clone()),
                FakeLexical::Down => Err(Error::Lexical("connection refused".into())),
            }
        }
    }

    fn chunk(document_id: &str, chunk_id: u32, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            document_id: document_id.into(),
            chunk_id,
            text: format!("{} text {}", document_id, chunk_id),
            page: Some(1),
            source: format!("{}.pdf", document_id),
            tags: vec![],
            embedding: Some(embedding),
        }
    }

    fn hit(document_id: &str, chunk_id: u32, score: f32) -> LexicalHit {
        LexicalHit {
            document_id: document_id.into(),
            chunk_id,
            source: Some(format!("{}.pdf", document_id)),
            page: Some(1),
            text: format!("{} text {}", document_id, chunk_id),
            tags: vec![],
            score,
        }
    }

    fn retriever(
        chunks: Vec<ChunkRecord>,
        lexical: FakeLexical,
        params: HybridParams,
    ) -> HybridRetriever {
        HybridRetriever::new(
            Arc::new(FakeEmbedder {
                vector: vec![1.0, 0.0],
            }),
            Arc::new(FakeVectors { chunks }),
            Arc::new(lexical),
            params,
        )
    }

    #[tokio::test]
    async fn test_empty_corpus_yields_empty_evidence() {
        let engine = retriever(vec![], FakeLexical::Hits(vec![]), HybridParams::default());
        let result = engine.retrieve("anything?", 5, None).await.unwrap();

        assert!(result.chunks.is_empty());
        assert_eq!(result.mode, RetrievalMode::VectorFallback);
    }

    #[tokio::test]
    async fn test_restricted_path_stays_inside_document() {
        let chunks = vec![
            chunk("a", 0, vec![1.0, 0.0]),
            chunk("a", 1, vec![0.9, 0.1]),
            chunk("b", 0, vec![1.0, 0.0]),
        ];
        let engine = retriever(chunks, FakeLexical::Hits(vec![]), HybridParams::default());

        let result = engine.retrieve("vpc", 5, Some("a")).await.unwrap();
        assert_eq!(result.mode, RetrievalMode::Restricted);
        assert!(!result.chunks.is_empty());
        assert!(result.chunks.iter().all(|c| c.chunk.document_id == "a"));
    }

    #[tokio::test]
    async fn test_neighbor_expansion_around_single_center() {
        let chunks: Vec<ChunkRecord> =
            (0..10).map(|i| chunk("d", i, vec![1.0, 0.0])).collect();
        let engine = retriever(
            chunks,
            FakeLexical::Hits(vec![hit("d", 5, 9.0)]),
            HybridParams::default(),
        );

        let result = engine.retrieve("needle", 5, None).await.unwrap();
        assert_eq!(result.mode, RetrievalMode::Hybrid);

        let mut ids: Vec<u32> = result.chunks.iter().map(|c| c.chunk.chunk_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![3, 4, 5, 6, 7]);

        let center = result.chunks.iter().find(|c| c.chunk.chunk_id == 5).unwrap();
        assert!(center.is_center);
        assert_eq!(center.distance_from_center, 0);
    }

    #[tokio::test]
    async fn test_expansion_clips_at_document_start() {
        let chunks: Vec<ChunkRecord> =
            (0..4).map(|i| chunk("d", i, vec![1.0, 0.0])).collect();
        let engine = retriever(
            chunks,
            FakeLexical::Hits(vec![hit("d", 1, 4.0)]),
            HybridParams::default(),
        );

        let result = engine.retrieve("q", 5, None).await.unwrap();
        let mut ids: Vec<u32> = result.chunks.iter().map(|c| c.chunk.chunk_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fusion_tie_breaks_deterministically() {
        // Two documents, identical embeddings and identical BM25 scores:
        // every score ties, so ordering falls to (document_id, chunk_id).
        let chunks = vec![chunk("b", 0, vec![1.0, 0.0]), chunk("a", 0, vec![1.0, 0.0])];
        let params = HybridParams {
            neighbor_window: 0,
            ..Default::default()
        };
        let engine = retriever(
            chunks,
            FakeLexical::Hits(vec![hit("b", 0, 3.0), hit("a", 0, 3.0)]),
            params,
        );

        let result = engine.retrieve("q", 5, None).await.unwrap();
        let order: Vec<String> = result
            .chunks
            .iter()
            .map(|c| c.chunk.document_id.clone())
            .collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_bm25_outage_degrades_to_vector_search() {
        let chunks = vec![chunk("d", 0, vec![1.0, 0.0]), chunk("d", 1, vec![0.0, 1.0])];
        let engine = retriever(chunks, FakeLexical::Down, HybridParams::default());

        let result = engine.retrieve("q", 1, None).await.unwrap();
        assert_eq!(result.mode, RetrievalMode::VectorFallback);
        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].chunk.chunk_id, 0);
    }

    #[tokio::test]
    async fn test_bm25_top_hit_survives_dense_competition() {
        // "z" wins every dense comparison; "needle" is the BM25 #1 with
        // an orthogonal embedding. It must still come back as a center.
        let mut chunks: Vec<ChunkRecord> =
            (0..3).map(|i| chunk("z", i, vec![1.0, 0.0])).collect();
        chunks.push(chunk("needle", 0, vec![0.0, 1.0]));

        let hits = vec![
            hit("needle", 0, 9.0),
            hit("z", 0, 5.0),
            hit("z", 1, 4.0),
            hit("z", 2, 3.0),
        ];
        let engine = retriever(chunks, FakeLexical::Hits(hits), HybridParams::default());

        let result = engine.retrieve("q", 5, None).await.unwrap();
        assert!(result
            .chunks
            .iter()
            .any(|c| c.is_center && c.chunk.document_id == "needle"));
    }

    #[tokio::test]
    async fn test_unresolvable_bm25_candidates_fall_back() {
        // BM25 refers to a chunk the vector store has never seen.
        let chunks = vec![chunk("real", 0, vec![1.0, 0.0])];
        let engine = retriever(
            chunks,
            FakeLexical::Hits(vec![hit("ghost", 3, 2.0)]),
            HybridParams::default(),
        );

        let result = engine.retrieve("q", 5, None).await.unwrap();
        assert_eq!(result.mode, RetrievalMode::VectorFallback);
        assert_eq!(result.chunks[0].chunk.document_id, "real");
    }

    #[tokio::test]
    async fn test_replay_is_deterministic() {
        let chunks: Vec<ChunkRecord> = (0..10)
            .map(|i| chunk("d", i, vec![1.0, 0.1 * i as f32]))
            .collect();
        let hits: Vec<LexicalHit> = (0..10).map(|i| hit("d", i, 5.0)).collect();

        let engine = retriever(
            chunks,
            FakeLexical::Hits(hits),
            HybridParams::default(),
        );

        let first = engine.retrieve("q", 5, None).await.unwrap();
        let second = engine.retrieve("q", 5, None).await.unwrap();

        let ids = |r: &Retrieval| -> Vec<(String, u32)> {
            r.chunks
                .iter()
                .map(|c| (c.chunk.document_id.clone(), c.chunk.chunk_id))
                .collect()
        };
        assert_eq!(ids(&first), ids(&second));
    }

    #[tokio::test]
    async fn test_evidence_capped_at_max_context_chunks() {
        let chunks: Vec<ChunkRecord> =
            (0..40).map(|i| chunk("d", i, vec![1.0, 0.0])).collect();
        let hits: Vec<LexicalHit> = (0..40).map(|i| hit("d", i, 5.0)).collect();

        let params = HybridParams {
            center_k: 40,
            center_rel_threshold: 0.0,
            max_context_chunks: 8,
            ..Default::default()
        };
        let engine = retriever(chunks, FakeLexical::Hits(hits), params);

        let result = engine.retrieve("q", 5, None).await.unwrap();
        assert_eq!(result.chunks.len(), 8);
    }
}

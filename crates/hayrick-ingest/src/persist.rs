//! The ingestion pipeline: pages → chunks → embeddings → both stores.
//!
//! The two writes are deliberately asymmetric. The vector store is the
//! source of truth for chunk identity (neighbor math needs its
//! deterministic ids), so an upsert failure aborts the ingest. BM25 is
//! an accelerator that can be rebuilt by re-ingesting, so an indexing
//! failure is logged at warn level and swallowed.

use std::sync::Arc;

use tracing::{info, warn};

use hayrick_core::{
    ChunkRecord, Embedder, Error, IndexChunkRequest, LexicalIndex, Result, VectorIndex,
};

use crate::chunker::{Chunker, PageText};

/// What `/ingest` reports back.
#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub document_id: String,
    pub chunks: usize,
    pub characters: usize,
    pub embedding_dim: usize,
    /// First 200 characters of the first chunk.
    pub preview: Option<String>,
}

pub struct Ingester {
    embedder: Arc<dyn Embedder>,
    vectors: Arc<dyn VectorIndex>,
    lexical: Arc<dyn LexicalIndex>,
    chunker: Chunker,
}

impl Ingester {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorIndex>,
        lexical: Arc<dyn LexicalIndex>,
        chunker: Chunker,
    ) -> Self {
        Self {
            embedder,
            vectors,
            lexical,
            chunker,
        }
    }

    /// Chunk, embed and dual-write one document. Re-ingesting the same
    /// `document_id` is idempotent on the vector side because the ids
    /// are deterministic.
    pub async fn ingest(
        &self,
        document_id: &str,
        source: &str,
        tags: &[String],
        pages: &[PageText],
    ) -> Result<IngestReceipt> {
        let document_id = document_id.trim();
        if document_id.is_empty() {
            return Err(Error::Validation("document_id cannot be empty".into()));
        }

        let chunks = self.chunker.chunk_pages(pages);
        if chunks.is_empty() {
            return Err(Error::Validation("no chunks produced from document".into()));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        let embedding_dim = embeddings.first().map(|e| e.len()).unwrap_or(0);

        let records: Vec<ChunkRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| ChunkRecord {
                document_id: document_id.to_string(),
                chunk_id: chunk.chunk_id,
                text: chunk.text.clone(),
                page: chunk.page,
                source: source.to_string(),
                tags: tags.to_vec(),
                embedding: Some(embedding),
            })
            .collect();

        // Authoritative write first.
        self.vectors.upsert(&records).await?;

        // Best-effort BM25 indexing.
        for record in &records {
            let request = IndexChunkRequest {
                document_id: record.document_id.clone(),
                chunk_id: record.chunk_id,
                source: Some(record.source.clone()),
                page: record.page,
                text: record.text.clone(),
                tags: record.tags.clone(),
            };
            if let Err(e) = self.lexical.index_chunk(&request).await {
                warn!(
                    "BM25 indexing failed for {}::{}: {}",
                    record.document_id, record.chunk_id, e
                );
            }
        }

        let characters = records.iter().map(|r| r.text.chars().count()).sum();
        let preview = records
            .first()
            .map(|r| r.text.chars().take(200).collect::<String>());

        info!(
            document_id,
            chunks = records.len(),
            embedding_dim,
            "Ingested document"
        );

        Ok(IngestReceipt {
            document_id: document_id.to_string(),
            chunks: records.len(),
            characters,
            embedding_dim,
            preview,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use hayrick_core::{LexicalHit, ScoredChunk};

    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3]).collect())
        }
    }

    #[derive(Default)]
    struct RecordingVectors {
        upserted: Mutex<Vec<ChunkRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl VectorIndex for RecordingVectors {
        async fn upsert(&self, chunks: &[ChunkRecord]) -> Result<()> {
            if self.fail {
                return Err(Error::VectorStore("store unavailable".into()));
            }
            self.upserted.lock().extend(chunks.iter().cloned());
            Ok(())
        }

        async fn get_by_ids(&self, _ids: &[String]) -> Result<Vec<ChunkRecord>> {
            Ok(Vec::new())
        }

        async fn query_by_vector(
            &self,
            _vector: &[f32],
            _top_k: usize,
            _document_id: Option<&str>,
        ) -> Result<Vec<ScoredChunk>> {
            Ok(Vec::new())
        }

        async fn get_where(&self, _field: &str, _value: &str) -> Result<Vec<ChunkRecord>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct RecordingLexical {
        indexed: Mutex<Vec<IndexChunkRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl LexicalIndex for RecordingLexical {
        async fn index_chunk(&self, chunk: &IndexChunkRequest) -> Result<()> {
            if self.fail {
                return Err(Error::Lexical("opensearch down".into()));
            }
            self.indexed.lock().push(chunk.clone());
            Ok(())
        }

        async fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<LexicalHit>> {
            Ok(Vec::new())
        }
    }

    fn ingester(vectors: Arc<RecordingVectors>, lexical: Arc<RecordingLexical>) -> Ingester {
        Ingester::new(
            Arc::new(FakeEmbedder),
            vectors,
            lexical,
            Chunker::new(10, 2).unwrap(),
        )
    }

    fn pages(text: &str) -> Vec<PageText> {
        vec![PageText {
            page: Some(1),
            text: text.into(),
        }]
    }

    #[tokio::test]
    async fn test_ingest_writes_both_stores_with_same_identity() {
        let vectors = Arc::new(RecordingVectors::default());
        let lexical = Arc::new(RecordingLexical::default());
        let receipt = ingester(vectors.clone(), lexical.clone())
            .ingest("doc", "doc.txt", &[], &pages("one two three"))
            .await
            .unwrap();

        assert_eq!(receipt.chunks, 1);
        assert_eq!(receipt.embedding_dim, 3);
        assert_eq!(receipt.preview.as_deref(), Some("one two three"));

        let upserted = vectors.upserted.lock();
        let indexed = lexical.indexed.lock();
        assert_eq!(upserted.len(), 1);
        assert_eq!(indexed.len(), 1);
        assert_eq!(upserted[0].key(), "doc::0");
        assert_eq!(indexed[0].document_id, "doc");
        assert_eq!(indexed[0].chunk_id, 0);
        assert_eq!(upserted[0].text, indexed[0].text);
    }

    #[tokio::test]
    async fn test_characters_counts_code_points_not_bytes() {
        let vectors = Arc::new(RecordingVectors::default());
        let lexical = Arc::new(RecordingLexical::default());

        // Multibyte text: more UTF-8 bytes than characters.
        let receipt = ingester(vectors, lexical)
            .ingest("d", "d.txt", &[], &pages("café über 日本語"))
            .await
            .unwrap();

        assert_eq!(receipt.characters, "café über 日本語".chars().count());
    }

    #[tokio::test]
    async fn test_chunk_ids_are_dense_from_zero() {
        let vectors = Arc::new(RecordingVectors::default());
        let lexical = Arc::new(RecordingLexical::default());
        let text = (0..25).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");

        ingester(vectors.clone(), lexical)
            .ingest("d", "d.txt", &[], &pages(&text))
            .await
            .unwrap();

        let ids: Vec<u32> = vectors.upserted.lock().iter().map(|r| r.chunk_id).collect();
        assert_eq!(ids, (0..ids.len() as u32).collect::<Vec<_>>());
        assert!(ids.len() > 1);
    }

    #[tokio::test]
    async fn test_bm25_failure_is_swallowed() {
        let vectors = Arc::new(RecordingVectors::default());
        let lexical = Arc::new(RecordingLexical {
            fail: true,
            ..Default::default()
        });

        let receipt = ingester(vectors.clone(), lexical)
            .ingest("d", "d.txt", &[], &pages("still works"))
            .await
            .unwrap();

        assert_eq!(receipt.chunks, 1);
        assert_eq!(vectors.upserted.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_vector_failure_aborts_ingest() {
        let vectors = Arc::new(RecordingVectors {
            fail: true,
            ..Default::default()
        });
        let lexical = Arc::new(RecordingLexical::default());

        let err = ingester(vectors, lexical.clone())
            .ingest("d", "d.txt", &[], &pages("will not land"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::VectorStore(_)));
        // Nothing reached BM25 either: the authoritative write failed first.
        assert!(lexical.indexed.lock().is_empty());
    }

    #[tokio::test]
    async fn test_blank_document_id_is_rejected() {
        let vectors = Arc::new(RecordingVectors::default());
        let lexical = Arc::new(RecordingLexical::default());

        let err = ingester(vectors, lexical)
            .ingest("   ", "d.txt", &[], &pages("text"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_document_id_is_trimmed_in_ids() {
        let vectors = Arc::new(RecordingVectors::default());
        let lexical = Arc::new(RecordingLexical::default());

        ingester(vectors.clone(), lexical)
            .ingest("  padded  ", "p.txt", &[], &pages("some text"))
            .await
            .unwrap();

        assert_eq!(vectors.upserted.lock()[0].key(), "padded::0");
    }
}

//! Hayrick Ingest — document loading, chunking and dual-write
//! persistence.
//!
//! A document is split into ordered fixed-size overlapping chunks which
//! are written to both stores: the vector store keyed by
//! `{document_id}::{chunk_id}` (authoritative), and the BM25 index
//! (best-effort — an outage there is logged and ingestion succeeds).

pub mod chunker;
pub mod loader;
pub mod persist;

pub use chunker::{Chunker, DocumentChunk, PageText, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use loader::{load_pages, DocumentKind};
pub use persist::{IngestReceipt, Ingester};

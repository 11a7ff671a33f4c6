//! Hayrick Vector — Chroma adapter.
//!
//! Chunks are keyed by the deterministic `{document_id}::{chunk_id}`
//! string, which is what lets neighbor expansion be a batch get rather
//! than a range query. Metadata written to the store is scalar-only.

pub mod chroma;
pub mod sanitize;

pub use chroma::ChromaStore;

//! Hayrick Retrieve — the hybrid retrieval engine.
//!
//! BM25 candidates are fused with dense cosine similarity at chunk
//! level, the best-scoring chunks become centers, and each center is
//! expanded with its adjacent neighbors to restore local context. The
//! pipeline stages (candidate pull, fusion, center selection, neighbor
//! expansion, ranking, context assembly) are plain functions in
//! [`stages`]; [`engine`] wires them to the remote stores.

pub mod engine;
pub mod params;
pub mod sources;
pub mod stages;

pub use engine::{HybridRetriever, Retrieval, RetrievalMode};
pub use params::HybridParams;
pub use sources::assemble_sources;
pub use stages::{build_context, RetrievedChunk};

//! Hayrick Core — shared error enum, env configuration, chunk schema and
//! the trait seams the retrieval engine is built against.

pub mod config;
pub mod error;
pub mod schema;
pub mod traits;

pub use config::{ChromaConfig, ModelConfig, OpenSearchConfig, SearchServiceConfig};
pub use error::{Error, Result};
pub use schema::{chunk_key, parse_chunk_key, AnswerRecord, ChunkRecord, IndexChunkRequest, LexicalHit, ScoredChunk, Source};
pub use traits::{Embedder, LexicalIndex, VectorIndex};

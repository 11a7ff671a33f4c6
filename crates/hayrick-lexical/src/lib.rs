//! Hayrick Lexical — the BM25 side of the stack.
//!
//! `index` is the typed facade the search node wraps around OpenSearch;
//! `client` is the HTTP client the ingestion and query nodes use to
//! reach the search node. BM25 ids are store-generated and never used
//! for neighbor math; the deterministic addressing lives in the vector
//! store.

pub mod client;
pub mod index;
pub mod types;

pub use client::SearchServiceClient;
pub use index::OpenSearchIndex;
pub use types::{SearchRequest, SearchResponse};

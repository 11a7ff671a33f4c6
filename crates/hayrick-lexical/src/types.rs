//! Wire types for the search node's API.

use serde::{Deserialize, Serialize};

use hayrick_core::LexicalHit;

/// `top_k` bounds for `/search`.
pub const MIN_TOP_K: usize = 1;
pub const MAX_TOP_K: usize = 50;

fn default_top_k() -> usize {
    10
}

/// Body of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Optional filter: only search these document ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_ids: Option<Vec<String>>,
    /// Optional filter: only search these source filenames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, top_k: usize) -> Self {
        Self {
            query: query.into(),
            top_k,
            document_ids: None,
            sources: None,
        }
    }

    /// `top_k` clamped to the allowed range.
    pub fn clamped_top_k(&self) -> usize {
        self.top_k.clamp(MIN_TOP_K, MAX_TOP_K)
    }
}

/// Response of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<LexicalHit>,
    pub total: usize,
}

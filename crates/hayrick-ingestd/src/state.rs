//! Shared application state.

use std::sync::Arc;

use hayrick_core::{ChromaConfig, ModelConfig, Result, SearchServiceConfig};
use hayrick_embed::EmbeddingClient;
use hayrick_ingest::{Chunker, Ingester};
use hayrick_lexical::SearchServiceClient;
use hayrick_vector::ChromaStore;

pub struct AppState {
    pub ingester: Ingester,
}

impl AppState {
    pub fn from_env() -> Result<Self> {
        let models = ModelConfig::from_env()?;
        let embedder = Arc::new(EmbeddingClient::new(&models));
        let vectors = Arc::new(ChromaStore::new(&ChromaConfig::from_env()));
        let lexical = Arc::new(SearchServiceClient::new(&SearchServiceConfig::from_env()));

        Ok(Self {
            ingester: Ingester::new(embedder, vectors, lexical, Chunker::default()),
        })
    }
}

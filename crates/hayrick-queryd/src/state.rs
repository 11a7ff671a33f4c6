//! Shared application state.

use std::sync::Arc;

use hayrick_chat::ChatClient;
use hayrick_core::{ChromaConfig, ModelConfig, Result, SearchServiceConfig};
use hayrick_embed::EmbeddingClient;
use hayrick_lexical::SearchServiceClient;
use hayrick_retrieve::{HybridParams, HybridRetriever};
use hayrick_vector::ChromaStore;

pub struct AppState {
    pub retriever: HybridRetriever,
    pub chat: ChatClient,
    pub params: HybridParams,
}

impl AppState {
    pub fn from_env() -> Result<Self> {
        let models = ModelConfig::from_env()?;
        let params = HybridParams::from_env();

        let embedder = Arc::new(EmbeddingClient::new(&models));
        let vectors = Arc::new(ChromaStore::new(&ChromaConfig::from_env()));
        let lexical = Arc::new(SearchServiceClient::new(&SearchServiceConfig::from_env()));

        Ok(Self {
            retriever: HybridRetriever::new(embedder, vectors, lexical, params.clone()),
            chat: ChatClient::new(&models),
            params,
        })
    }
}

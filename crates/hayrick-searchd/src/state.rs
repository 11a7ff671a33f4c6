//! Shared application state.

use hayrick_core::OpenSearchConfig;
use hayrick_lexical::OpenSearchIndex;

pub struct AppState {
    pub index: OpenSearchIndex,
}

impl AppState {
    pub fn new(config: &OpenSearchConfig) -> Self {
        Self {
            index: OpenSearchIndex::new(config),
        }
    }
}

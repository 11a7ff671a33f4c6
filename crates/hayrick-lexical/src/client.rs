//! HTTP client for the search node, used by the other two services.
//!
//! Search failures and malformed responses degrade to "no hits" here;
//! the caller decides what that means (the query node falls back to
//! full-corpus vector search, ingestion keeps going). The vector store
//! stays authoritative either way.

use std::time::Duration;

use tracing::{info, warn};

use hayrick_core::{Error, IndexChunkRequest, LexicalHit, LexicalIndex, Result, SearchServiceConfig};

use crate::types::{SearchRequest, SearchResponse};

pub struct SearchServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl SearchServiceClient {
    pub fn new(config: &SearchServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.url.clone(),
        }
    }
}

#[async_trait::async_trait]
impl LexicalIndex for SearchServiceClient {
    async fn index_chunk(&self, chunk: &IndexChunkRequest) -> Result<()> {
        if chunk.text.trim().is_empty() {
            return Ok(());
        }

        let url = format!("{}/index", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(chunk)
            .send()
            .await
            .map_err(|e| Error::Lexical(format!("index request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Lexical(format!("index error {}", status)));
        }
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<LexicalHit>> {
        let url = format!("{}/search", self.base_url);
        let body = SearchRequest::new(query, top_k);

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("BM25 search unreachable: {}", e);
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            warn!("BM25 search returned {}", response.status());
            return Ok(Vec::new());
        }

        // A response that fails validation counts as no hits, not an
        // error; the pipeline degrades the same way as an outage.
        match response.json::<SearchResponse>().await {
            Ok(parsed) => {
                info!(hits = parsed.hits.len(), total = parsed.total, "BM25 search");
                Ok(parsed.hits)
            }
            Err(e) => {
                warn!("BM25 search response failed validation: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

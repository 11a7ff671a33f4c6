//! Hayrick Embed — typed client for an OpenAI-compatible embeddings
//! endpoint.
//!
//! The same client (and therefore the same model) serves ingestion and
//! queries, which is what keeps cosine similarity meaningful across the
//! collection. The dimension of the first successful call is pinned and
//! every later batch is checked against it.

use std::time::Duration;

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use hayrick_core::{Embedder, Error, ModelConfig, Result};

/// Client for `{BASE_URL}/embeddings`.
pub struct EmbeddingClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: RwLock<Option<usize>>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(config: &ModelConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model_embed.clone(),
            dimension: RwLock::new(None),
        }
    }

    /// The pinned embedding dimension, once at least one call succeeded.
    pub fn dimension(&self) -> Option<usize> {
        *self.dimension.read()
    }

    /// Validate a batch of vectors against the request and the pinned
    /// dimension, pinning it on first use.
    fn check_shape(&self, requested: usize, vectors: &[Vec<f32>]) -> Result<()> {
        if vectors.len() != requested {
            return Err(Error::Embedding(format!(
                "requested {} embeddings, got {}",
                requested,
                vectors.len()
            )));
        }

        let Some(first) = vectors.first() else {
            return Ok(());
        };

        if first.is_empty() || vectors.iter().any(|v| v.len() != first.len()) {
            return Err(Error::Embedding(
                "embedding response has inconsistent dimensions".into(),
            ));
        }

        let mut pinned = self.dimension.write();
        match *pinned {
            Some(dim) if dim != first.len() => Err(Error::Embedding(format!(
                "embedding dimension changed from {} to {}",
                dim,
                first.len()
            ))),
            Some(_) => Ok(()),
            None => {
                debug!("Pinned embedding dimension: {}", first.len());
                *pinned = Some(first.len());
                Ok(())
            }
        }
    }
}

#[async_trait::async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!("API error {}: {}", status, detail)));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("bad response body: {}", e)))?;

        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
        self.check_shape(texts.len(), &vectors)?;
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> EmbeddingClient {
        EmbeddingClient::new(&ModelConfig {
            base_url: "http://localhost:12434".into(),
            api_key: "anything".into(),
            model_embed: "test-embed".into(),
            model_chat: "test-chat".into(),
        })
    }

    #[test]
    fn test_check_shape_pins_dimension() {
        let client = test_client();
        assert_eq!(client.dimension(), None);

        client
            .check_shape(2, &[vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]])
            .unwrap();
        assert_eq!(client.dimension(), Some(3));
    }

    #[test]
    fn test_check_shape_rejects_count_mismatch() {
        let client = test_client();
        let err = client.check_shape(3, &[vec![0.1]]).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn test_check_shape_rejects_ragged_batch() {
        let client = test_client();
        let err = client
            .check_shape(2, &[vec![0.1, 0.2], vec![0.3]])
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn test_check_shape_rejects_dimension_drift() {
        let client = test_client();
        client.check_shape(1, &[vec![0.1, 0.2]]).unwrap();

        let err = client.check_shape(1, &[vec![0.1, 0.2, 0.3]]).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        // The originally pinned dimension is kept.
        assert_eq!(client.dimension(), Some(2));
    }

    #[test]
    fn test_response_shape_parses() {
        let raw = serde_json::json!({
            "object": "list",
            "data": [
                {"object": "embedding", "index": 0, "embedding": [0.25, -0.5]},
                {"object": "embedding", "index": 1, "embedding": [0.75, 0.5]},
            ],
            "model": "test-embed",
        });
        let parsed: EmbeddingsResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[0].embedding, vec![0.25, -0.5]);
    }
}

//! Typed facade over the OpenSearch BM25 index.
//!
//! The index mapping is owned here: `text` is the only analyzed field;
//! identity and filter fields are keyword/integer. The index is ensured
//! lazily and the create path tolerates losing the creation race to a
//! concurrent writer.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use hayrick_core::{Error, IndexChunkRequest, LexicalHit, OpenSearchConfig, Result};

use crate::types::SearchRequest;

pub struct OpenSearchIndex {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    pub index: String,
}

/// Acknowledgement of one indexed chunk.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct IndexAck {
    pub index: String,
    pub id: String,
    pub result: String,
}

#[derive(Deserialize)]
struct RawSearchResponse {
    hits: RawHits,
}

#[derive(Deserialize)]
struct RawHits {
    total: Value,
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_score", default)]
    score: f32,
    #[serde(rename = "_source")]
    source: LexicalHit,
}

impl OpenSearchIndex {
    pub fn new(config: &OpenSearchConfig) -> Self {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(10));
        if config.use_ssl() {
            // Dev parity with the compose setup; certs are not verified.
            builder = builder.danger_accept_invalid_certs(true);
        }

        Self {
            client: builder.build().unwrap_or_default(),
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            index: config.index.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if !self.username.is_empty() {
            req = req.basic_auth(&self.username, Some(&self.password));
        }
        req
    }

    /// Cluster info, for health checks.
    pub async fn info(&self) -> Result<Value> {
        let response = self
            .request(reqwest::Method::GET, "/")
            .send()
            .await
            .map_err(|e| Error::Lexical(format!("opensearch unreachable: {}", e)))?;
        response
            .json()
            .await
            .map_err(|e| Error::Lexical(format!("bad info response: {}", e)))
    }

    /// Create the BM25 index if it does not exist yet. Safe to call from
    /// multiple writers; the already-exists race is not an error.
    pub async fn ensure_index(&self) -> Result<()> {
        let head = self
            .request(reqwest::Method::HEAD, &format!("/{}", self.index))
            .send()
            .await
            .map_err(|e| Error::Lexical(format!("opensearch unreachable: {}", e)))?;
        if head.status().is_success() {
            return Ok(());
        }

        let response = self
            .request(reqwest::Method::PUT, &format!("/{}", self.index))
            .json(&index_body())
            .send()
            .await
            .map_err(|e| Error::Lexical(format!("index create failed: {}", e)))?;

        if response.status().is_success() {
            info!("Created index {:?}", self.index);
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        if detail.contains("resource_already_exists_exception") {
            debug!("Index {:?} already exists (race)", self.index);
            return Ok(());
        }
        Err(Error::Lexical(format!("index create error: {}", detail)))
    }

    /// Index one chunk; id generation is delegated to the store.
    pub async fn index_chunk(&self, chunk: &IndexChunkRequest) -> Result<IndexAck> {
        self.ensure_index().await?;

        let body = json!({
            "document_id": chunk.document_id,
            "chunk_id": chunk.chunk_id,
            "source": chunk.source,
            "page": chunk.page,
            "text": chunk.text,
            "tags": chunk.tags,
        });

        let response = self
            .request(reqwest::Method::POST, &format!("/{}/_doc", self.index))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Lexical(format!("index request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Lexical(format!("index error {}: {}", status, detail)));
        }

        let ack: Value = response
            .json()
            .await
            .map_err(|e| Error::Lexical(format!("bad index response: {}", e)))?;

        Ok(IndexAck {
            index: ack["_index"].as_str().unwrap_or(&self.index).to_string(),
            id: ack["_id"].as_str().unwrap_or_default().to_string(),
            result: ack["result"].as_str().unwrap_or_default().to_string(),
        })
    }

    /// BM25 search over the `text` field with optional term filters.
    pub async fn search(&self, request: &SearchRequest) -> Result<(Vec<LexicalHit>, usize)> {
        self.ensure_index().await?;

        let body = search_body(request);
        let response = self
            .request(reqwest::Method::POST, &format!("/{}/_search", self.index))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Lexical(format!("search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Lexical(format!("search error {}: {}", status, detail)));
        }

        let raw: RawSearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Lexical(format!("bad search response: {}", e)))?;

        Ok(hits_from_response(raw))
    }
}

/// Settings + mappings for the BM25 index.
fn index_body() -> Value {
    json!({
        "settings": {
            "index": {
                "number_of_shards": 1,
                "number_of_replicas": 0,
            }
        },
        "mappings": {
            "properties": {
                "document_id": {"type": "keyword"},
                "chunk_id": {"type": "integer"},
                "source": {"type": "keyword"},
                "page": {"type": "integer"},
                "text": {"type": "text"},
                "tags": {"type": "keyword"},
            }
        }
    })
}

/// Build the bool query: BM25 match on `text`, term filters for the
/// optional document/source restrictions.
fn search_body(request: &SearchRequest) -> Value {
    let mut filter = Vec::new();
    if let Some(ids) = &request.document_ids {
        filter.push(json!({"terms": {"document_id": ids}}));
    }
    if let Some(sources) = &request.sources {
        filter.push(json!({"terms": {"source": sources}}));
    }

    json!({
        "query": {
            "bool": {
                "must": [{"match": {"text": request.query}}],
                "filter": filter,
            }
        },
        "size": request.clamped_top_k(),
    })
}

fn hits_from_response(raw: RawSearchResponse) -> (Vec<LexicalHit>, usize) {
    // Total is an object on modern clusters, a bare integer on old ones.
    let total = match &raw.hits.total {
        Value::Object(obj) => obj.get("value").and_then(|v| v.as_u64()).unwrap_or(0) as usize,
        Value::Number(n) => n.as_u64().unwrap_or(0) as usize,
        _ => 0,
    };

    let hits = raw
        .hits
        .hits
        .into_iter()
        .map(|h| {
            let mut hit = h.source;
            hit.score = h.score;
            hit
        })
        .collect();

    (hits, total)
}

//! HTTP adapter for a Chroma collection.
//!
//! The collection is resolved lazily via get-or-create (cosine space)
//! and its id is cached for the life of the process. All operations go
//! through Chroma's REST API; the store process itself owns
//! `CHROMA_PERSIST_DIR`.

use std::time::Duration;

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use hayrick_core::{ChromaConfig, ChunkRecord, Error, Result, ScoredChunk, VectorIndex};

use crate::sanitize::{flatten_metadata, record_from_parts};

pub struct ChromaStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    collection_id: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct CollectionResponse {
    id: String,
}

/// Parallel arrays returned by `POST /collections/{id}/get`.
#[derive(Deserialize)]
struct GetResponse {
    #[serde(default)]
    ids: Vec<String>,
    #[serde(default)]
    documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Option<Vec<Option<Map<String, Value>>>>,
    #[serde(default)]
    embeddings: Option<Vec<Option<Vec<f32>>>>,
}

/// Nested arrays returned by `POST /collections/{id}/query` — one inner
/// array per query embedding.
#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

impl ChromaStore {
    pub fn new(config: &ChromaConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.url.clone(),
            collection: config.collection.clone(),
            collection_id: RwLock::new(None),
        }
    }

    /// Get-or-create the collection and cache its id.
    /// Idempotent and safe under concurrent callers.
    async fn collection_id(&self) -> Result<String> {
        if let Some(id) = self.collection_id.read().clone() {
            return Ok(id);
        }

        let url = format!("{}/api/v1/collections", self.base_url);
        let body = json!({
            "name": self.collection,
            "metadata": {"hnsw:space": "cosine"},
            "get_or_create": true,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::VectorStore(format!("collection request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::VectorStore(format!(
                "collection error {}: {}",
                status, detail
            )));
        }

        let parsed: CollectionResponse = response
            .json()
            .await
            .map_err(|e| Error::VectorStore(format!("bad collection response: {}", e)))?;

        debug!("Resolved collection {} -> {}", self.collection, parsed.id);
        *self.collection_id.write() = Some(parsed.id.clone());
        Ok(parsed.id)
    }

    async fn post_collection(&self, op: &str, body: Value) -> Result<reqwest::Response> {
        let id = self.collection_id().await?;
        let url = format!("{}/api/v1/collections/{}/{}", self.base_url, id, op);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::VectorStore(format!("{} request failed: {}", op, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::VectorStore(format!("{} error {}: {}", op, status, detail)));
        }

        Ok(response)
    }

    async fn get_with_body(&self, body: Value) -> Result<Vec<ChunkRecord>> {
        let response = self.post_collection("get", body).await?;
        let parsed: GetResponse = response
            .json()
            .await
            .map_err(|e| Error::VectorStore(format!("bad get response: {}", e)))?;
        Ok(records_from_get(parsed))
    }
}

/// Equality predicate in Chroma's filter syntax.
fn where_eq(field: &str, value: &str) -> Value {
    json!({ field: { "$eq": value } })
}

fn records_from_get(response: GetResponse) -> Vec<ChunkRecord> {
    let n = response.ids.len();
    let documents = response.documents.unwrap_or_default();
    let metadatas = response.metadatas.unwrap_or_default();
    let embeddings = response.embeddings.unwrap_or_default();

    (0..n)
        .filter_map(|i| {
            record_from_parts(
                documents.get(i).cloned().flatten(),
                metadatas.get(i).cloned().flatten(),
                embeddings.get(i).cloned().flatten(),
            )
        })
        .collect()
}

fn scored_from_query(response: QueryResponse) -> Vec<ScoredChunk> {
    let Some(ids) = response.ids.into_iter().next() else {
        return Vec::new();
    };
    let documents = response
        .documents
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();
    let metadatas = response
        .metadatas
        .and_then(|m| m.into_iter().next())
        .unwrap_or_default();
    let distances = response
        .distances
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();

    (0..ids.len())
        .filter_map(|i| {
            let chunk = record_from_parts(
                documents.get(i).cloned().flatten(),
                metadatas.get(i).cloned().flatten(),
                None,
            )?;
            // The store reports cosine distance; similarity is 1 − d.
            let cosine = distances.get(i).map(|d| 1.0 - d).unwrap_or(0.0);
            Some(ScoredChunk { chunk, cosine })
        })
        .collect()
}

#[async_trait::async_trait]
impl VectorIndex for ChromaStore {
    async fn upsert(&self, chunks: &[ChunkRecord]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut ids = Vec::with_capacity(chunks.len());
        let mut documents = Vec::with_capacity(chunks.len());
        let mut embeddings = Vec::with_capacity(chunks.len());
        let mut metadatas = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let embedding = chunk.embedding.as_ref().ok_or_else(|| {
                Error::VectorStore(format!("chunk {} has no embedding", chunk.key()))
            })?;
            ids.push(chunk.key());
            documents.push(chunk.text.clone());
            embeddings.push(embedding.clone());
            metadatas.push(Value::Object(flatten_metadata(chunk)));
        }

        debug!("Upserting {} chunks", ids.len());

        self.post_collection(
            "upsert",
            json!({
                "ids": ids,
                "documents": documents,
                "embeddings": embeddings,
                "metadatas": metadatas,
            }),
        )
        .await?;
        Ok(())
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<ChunkRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.get_with_body(json!({
            "ids": ids,
            "include": ["documents", "metadatas", "embeddings"],
        }))
        .await
    }

    async fn query_by_vector(
        &self,
        vector: &[f32],
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        let mut body = json!({
            "query_embeddings": [vector],
            "n_results": top_k,
            "include": ["documents", "metadatas", "distances"],
        });
        if let Some(doc) = document_id {
            body["where"] = where_eq("document_id", doc.trim());
        }

        let response = self.post_collection("query", body).await?;
        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::VectorStore(format!("bad query response: {}", e)))?;
        Ok(scored_from_query(parsed))
    }

    async fn get_where(&self, field: &str, value: &str) -> Result<Vec<ChunkRecord>> {
        self.get_with_body(json!({
            "where": where_eq(field, value),
            "include": ["documents", "metadatas"],
        }))
        .await
    }
}

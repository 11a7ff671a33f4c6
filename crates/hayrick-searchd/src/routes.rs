//! HTTP route handlers for the search node.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use hayrick_core::IndexChunkRequest;
use hayrick_lexical::{SearchRequest, SearchResponse};

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/index", post(index_chunk))
        .route("/search", post(search))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health — verifies we can talk to OpenSearch.
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.index.info().await {
        Ok(info) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "opensearch": {
                    "cluster_name": info.get("cluster_name"),
                    "cluster_uuid": info.get("cluster_uuid"),
                    "version": info.get("version").and_then(|v| v.get("number")),
                    "index": state.index.index,
                },
            })),
        ),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({
                "status": "error",
                "reason": e.to_string(),
            })),
        ),
    }
}

/// POST /index — add one chunk to the BM25 index. Called by the
/// ingestion node for every chunk it persists.
async fn index_chunk(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IndexChunkRequest>,
) -> impl IntoResponse {
    match state.index.index_chunk(&req).await {
        Ok(ack) => (StatusCode::OK, Json(serde_json::json!(ack))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "detail": e.to_string() })),
        ),
    }
}

/// POST /search — BM25 search over indexed chunks.
async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    if req.query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "detail": "query must not be empty" })),
        );
    }

    match state.index.search(&req).await {
        Ok((hits, total)) => (
            StatusCode::OK,
            Json(serde_json::json!(SearchResponse { hits, total })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "detail": e.to_string() })),
        ),
    }
}

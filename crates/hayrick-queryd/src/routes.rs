//! HTTP route handlers for the query node.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use hayrick_chat::UNKNOWN_ANSWER;
use hayrick_core::{AnswerRecord, Error, Result};
use hayrick_retrieve::{assemble_sources, build_context};

use crate::state::AppState;

const MIN_QUESTION_CHARS: usize = 3;
const MAX_TOP_K: usize = 20;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/query", post(query))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "hayrick-queryd",
        "model": state.chat.default_model,
    }))
}

fn default_top_k() -> usize {
    5
}

/// Body of `POST /query`.
#[derive(Debug, Deserialize)]
struct QueryRequest {
    question: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
    #[serde(default)]
    model_name: Option<String>,
    #[serde(default)]
    document_id: Option<String>,
}

fn validate(request: &QueryRequest) -> Result<()> {
    if request.question.trim().chars().count() < MIN_QUESTION_CHARS {
        return Err(Error::Validation(format!(
            "question must be at least {} characters",
            MIN_QUESTION_CHARS
        )));
    }
    if request.top_k == 0 || request.top_k > MAX_TOP_K {
        return Err(Error::Validation(format!(
            "top_k must be between 1 and {}",
            MAX_TOP_K
        )));
    }
    Ok(())
}

/// POST /query — hybrid retrieval, answer generation, citations.
async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> impl IntoResponse {
    if let Err(e) = validate(&request) {
        return error_response(e);
    }

    let model_used = request
        .model_name
        .clone()
        .unwrap_or_else(|| state.chat.default_model.clone());

    info!(
        top_k = request.top_k,
        question_chars = request.question.len(),
        document_id = ?request.document_id,
        "Received query"
    );

    let retrieval = match state
        .retriever
        .retrieve(&request.question, request.top_k, request.document_id.as_deref())
        .await
    {
        Ok(retrieval) => retrieval,
        Err(e) => return error_response(e),
    };

    // Empty retrieval is not an error: answer with the fixed unknown
    // sentence without calling the model.
    if retrieval.chunks.is_empty() {
        return (
            StatusCode::OK,
            Json(serde_json::json!(AnswerRecord {
                answer: UNKNOWN_ANSWER.to_string(),
                sources: Vec::new(),
                context_used: 0,
                model_used,
            })),
        );
    }

    let (context, context_used) =
        build_context(&retrieval.chunks, state.params.context_char_budget);
    info!(mode = ?retrieval.mode, context_used, "Built context");

    let answer = match state
        .chat
        .generate_answer(&request.question, &context, request.model_name.as_deref())
        .await
    {
        Ok(answer) => answer,
        Err(e) => return error_response(e),
    };

    let sources = assemble_sources(&retrieval.chunks, request.top_k);

    (
        StatusCode::OK,
        Json(serde_json::json!(AnswerRecord {
            answer,
            sources,
            context_used,
            model_used,
        })),
    )
}

fn error_response(error: Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match error {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "detail": error.to_string() })))
}

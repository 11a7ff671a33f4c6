//! HTTP route handlers for the ingestion node.

use std::path::Path;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use hayrick_core::Error;
use hayrick_ingest::{load_pages, DocumentKind};

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(ingest))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "hayrick-ingestd",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// The multipart fields of one upload, before validation.
#[derive(Default)]
struct UploadForm {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Option<Vec<u8>>,
    document_id: Option<String>,
    source: Option<String>,
    version: Option<String>,
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, Error> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("bad multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                form.filename = field.file_name().map(String::from);
                form.content_type = field.content_type().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Validation(format!("failed to read file: {}", e)))?;
                form.bytes = Some(bytes.to_vec());
            }
            "document_id" => form.document_id = field.text().await.ok(),
            "source" => form.source = field.text().await.ok(),
            "version" => form.version = field.text().await.ok(),
            _ => {}
        }
    }

    Ok(form)
}

/// POST /ingest — multipart upload of one document.
async fn ingest(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let form = match read_form(&mut multipart).await {
        Ok(form) => form,
        Err(e) => return error_response(e),
    };

    let Some(bytes) = form.bytes else {
        return error_response(Error::Validation("missing 'file' field".into()));
    };

    let content_type = form.content_type.unwrap_or_default();
    let Some(kind) = DocumentKind::from_content_type(&content_type) else {
        return error_response(Error::Validation(format!(
            "Unsupported content type: {}. Allowed: {}",
            content_type,
            DocumentKind::allowed().join(", ")
        )));
    };

    let filename = form
        .filename
        .or_else(|| form.source.clone())
        .unwrap_or_else(|| "uploaded_document.pdf".to_string());

    // No explicit document_id: derive it from the filename stem.
    let document_id = form.document_id.unwrap_or_else(|| {
        Path::new(&filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&filename)
            .to_string()
    });
    let source = form.source.unwrap_or_else(|| filename.clone());

    // `version` is accepted for callers that track it; ingestion itself
    // does not branch on it.
    let _ = form.version;

    let pages = match load_pages(kind, &bytes) {
        Ok(pages) => pages,
        Err(e) => return error_response(e),
    };

    match state.ingester.ingest(&document_id, &source, &[], &pages).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "embedded",
                "document_id": receipt.document_id,
                "characters": receipt.characters,
                "chunks": receipt.chunks,
                "embedding_dim": receipt.embedding_dim,
                "preview": receipt.preview,
            })),
        ),
        Err(e) => error_response(e),
    }
}

fn error_response(error: Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match error {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "detail": error.to_string() })))
}

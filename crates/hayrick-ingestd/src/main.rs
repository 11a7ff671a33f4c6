//! hayrick-ingestd — the ingestion node.
//!
//! Receives documents over multipart upload, chunks them, embeds every
//! chunk and writes each one to both stores under its deterministic id.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = Arc::new(AppState::from_env()?);
    let app = routes::build_router(state);

    let port = hayrick_core::config::service_port(8001);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("hayrick-ingestd listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

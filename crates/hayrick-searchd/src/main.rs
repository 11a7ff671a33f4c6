//! hayrick-searchd — the BM25 search node.
//!
//! A thin, stateless facade over OpenSearch: it owns the lexical index
//! schema and exposes `/index` and `/search` to the other services.

use std::sync::Arc;

use tracing::{info, warn};
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

    let config = hayrick_core::OpenSearchConfig::from_env();
    let state = Arc::new(AppState::new(&config));

    // Ensure the BM25 index exists up front; every write path retries
    // anyway, so a cold OpenSearch only costs a warning here.
    if let Err(e) = state.index.ensure_index().await {
        warn!("Failed to ensure index at startup: {}", e);
    }

    let app = routes::build_router(state);

    let port = hayrick_core::config::service_port(8003);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("hayrick-searchd listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

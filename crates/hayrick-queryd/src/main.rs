//! hayrick-queryd — the query node.
//!
//! Runs the hybrid retrieval pipeline for each question, builds the
//! grounded prompt, calls the chat model and assembles ranked
//! citations.

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

    let port = hayrick_core::config::service_port(8002);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("hayrick-queryd listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

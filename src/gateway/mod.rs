//! Read-only HTTP gateway over the local tables, so token URIs of locally
//! deployed contracts resolve to metadata.

use std::net::SocketAddr;

use axum::{routing::get, Router};

use crate::tableland::TableReader;

mod handlers;
mod models;

use handlers::{health, not_found, query};

#[derive(Clone)]
pub struct AppState<R: TableReader> {
    pub reader: R,
    pub started_at: std::time::SystemTime,
    pub chain_id: u64,
}

pub fn router<R: TableReader + Clone + Send + Sync + 'static>(state: AppState<R>) -> Router {
    Router::new()
        .route("/health", get(health::<R>))
        .route("/query", get(query::<R>))
        .fallback(not_found)
        .with_state(state)
}

pub async fn serve<R: TableReader + Clone + Send + Sync + 'static>(
    addr: SocketAddr,
    reader: R,
    chain_id: u64,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    log::info!("🌐 Table gateway on http://{}", addr);

    let app = router(AppState {
        reader,
        started_at: std::time::SystemTime::now(),
        chain_id,
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 Gateway shutdown requested");
        })
        .await?;
    log::info!("👋 Gateway exited");
    Ok(())
}

mod config;
mod error;
mod routes;

use crate::config::Config;
use crate::routes::AppState;
use graph::{AuthFlow, GraphClient, TokenProvider};
use std::sync::Arc;
use sw_core::AccessClient;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use watcher::WatchEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;

    let tokens = TokenProvider::new();
    let graph_client = Arc::new(GraphClient::new(config.graph.clone(), tokens.clone())?);
    let auth = Arc::new(AuthFlow::new(config.graph.clone())?);
    let access_client: Arc<dyn AccessClient> = graph_client.clone();
    let engine = Arc::new(WatchEngine::new(access_client, config.poll_interval()));

    let state = AppState {
        tokens,
        auth,
        graph_client,
        engine: engine.clone(),
        download_dir: config.download_dir.clone(),
    };

    let app = routes::router(state);
    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "sharewatch listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    engine.shutdown().await;
    Ok(())
}

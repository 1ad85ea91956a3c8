use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vision_media::{MediaConnector, MediaConnectorConfig, MAX_IMAGE_EDGE};
use vlm_gateway::{
    build_router,
    generation::HttpWorkerRuntime,
    tools::ToolRegistry,
    AppState, ServerConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    let client = reqwest::Client::new();

    let connector = Arc::new(MediaConnector::new(
        client.clone(),
        MediaConnectorConfig {
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            max_edge: MAX_IMAGE_EDGE,
        },
    ));
    let runtime = Arc::new(HttpWorkerRuntime::new(
        client.clone(),
        config.worker_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    ));

    let bind_addr = config.bind_addr();
    let state = Arc::new(AppState {
        config,
        connector,
        runtime,
        tools: ToolRegistry::new(client),
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "vlm-gateway listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

//! Host monitor - runtime health monitoring and alerting service
//!
//! Samples host resources, instruments inbound requests, evaluates threshold
//! alerts on a schedule and serves the aggregate health signal over HTTP.

use std::sync::Arc;

use anyhow::Result;
use monitor_lib::{collector::HostProbe, LogSink, MonitorService};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting monitor");

    let config = config::MonitorConfig::load()?;
    info!(
        api_port = config.api_port,
        collection_interval_secs = config.collection_interval_secs,
        "Monitor configured"
    );

    let service = Arc::new(MonitorService::new(
        config.service_config(),
        Arc::new(HostProbe::new()),
        Arc::new(LogSink),
    ));
    service.start();

    let app_state = Arc::new(api::AppState::new(service.clone()));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal, then stop the background loops cleanly
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    service.stop().await;
    api_handle.abort();

    Ok(())
}

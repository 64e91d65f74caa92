//! DevMind Live server binary.
//!
//! Loads layered settings, applies CLI overrides, installs the metrics
//! recorder, and serves the HTTP + WebSocket surface until ctrl-c.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use devmind_server::AppState;
use devmind_server::http::router;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// DevMind Live — real-time update broadcaster.
#[derive(Parser, Debug)]
#[command(name = "devmind", version, about)]
struct Cli {
    /// Interface to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// TCP port to bind (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file path (default: ~/.devmind/settings.json).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. `info`, `devmind=debug`).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut settings = match cli.settings.as_deref() {
        Some(path) => devmind_settings::load_settings_from_path(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => devmind_settings::load_settings().context("loading settings")?,
    };
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    devmind_settings::init_settings(settings.clone());

    let metrics_handle = devmind_server::metrics::install_recorder();
    let state = AppState::new(Arc::new(settings.clone())).with_metrics(metrics_handle);
    let app = router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "devmind live server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("devmind live server stopped");
    Ok(())
}

/// Resolves when the process receives ctrl-c.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received, draining connections");
}

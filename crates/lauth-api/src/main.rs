//! # lauth-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the license authority. Configuration is
//! read from `LAUTH_*` environment variables (see [`lauth_api::state`]).

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use lauth_api::state::{AppConfig, AppState, LogFormat};
use lauth_registry::{JsonFileStore, LicenseRegistry};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("lauth-api: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let registry = match &config.state_path {
        Some(path) => {
            let store = JsonFileStore::open(path)
                .with_context(|| format!("opening license store {}", path.display()))?;
            LicenseRegistry::builder().store(store).build()
        }
        None => {
            tracing::warn!("LAUTH_STATE_PATH not set: licenses are kept in memory only");
            LicenseRegistry::in_memory()
        }
    };
    tracing::info!(licenses = registry.len()?, "license registry loaded");

    if config.admin_token.is_none() {
        tracing::warn!("LAUTH_ADMIN_TOKEN not set: admin API authentication is disabled");
    }

    let addr = config.bind_addr();
    let mut state = AppState::with_registry(registry, config);
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => tracing::warn!("Prometheus recorder not installed, /metrics disabled: {e}"),
    }

    let app = lauth_api::app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("license authority listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    tracing::info!("license authority stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

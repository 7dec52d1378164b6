//! Veo gateway server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{error, info};

use veo_api::config::load_dotenv;
use veo_api::logging::init_tracing;
use veo_api::{create_router, metrics, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log_level, config.log_json)?;

    info!(
        "Starting veo-api v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );
    info!(
        "API config: host={}, port={}, max_concurrent_tasks={}",
        config.host, config.port, config.max_concurrent_tasks
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;
    let metrics_enabled = config.metrics_enabled;

    let state = match AppState::new(config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create application state: {:#}", e);
            std::process::exit(1);
        }
    };

    let metrics_handle = if metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("Failed to install metrics recorder")?)
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

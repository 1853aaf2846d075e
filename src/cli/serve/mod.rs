//! Serve command - runs the cache API server

use std::net::SocketAddr;

use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::api::create_router_with_state;
use crate::config::AppConfig;
use crate::infrastructure::observability::{init_metrics, init_tracing, shutdown_tracing};

/// Arguments for the serve command; flags override the loaded configuration
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,
}

/// Run the API server
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    let config = apply_overrides(config, args);

    init_tracing(&config.logging, &config.observability.tracing);

    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load configuration, using defaults");
    }

    let components = crate::create_app_state_with_config(&config).await?;
    let sweeper = components
        .pending
        .spawn_sweeper(config.semantic_cache.pending_sweep_interval());

    let metrics = init_metrics(&config.observability.metrics);
    let app = create_router_with_state(
        components.state,
        metrics,
        &config.observability.metrics.path,
    );

    let addr = build_socket_addr(&config)?;
    info!("Starting semantic cache server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    shutdown_tracing();
    info!("Server shutdown complete");

    Ok(())
}

fn apply_overrides(mut config: AppConfig, args: ServeArgs) -> AppConfig {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

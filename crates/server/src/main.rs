//! unfurl server entry point.
//!
//! Boots the link-preview HTTP service. Logs are emitted as JSON lines;
//! verbosity follows `RUST_LOG` (default `info`).

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use unfurl_client::{FetchClient, FetchConfig};
use unfurl_core::AppConfig;

mod error;
mod handler;
mod housekeeping;
mod metrics;
mod routes;
mod service;

#[cfg(test)]
mod testing;

use service::PreviewService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = AppConfig::load()?;
    let upstream = FetchClient::new(FetchConfig::from(&config))?;
    let service = Arc::new(PreviewService::new(config.clone(), Arc::new(upstream)));

    let sampler = housekeeping::spawn(Arc::clone(&service));

    let listener =
        TcpListener::bind(&config.bind_addr).await.with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Starting unfurl server on {}", config.bind_addr);

    axum::serve(listener, handler::create_router(service)).with_graceful_shutdown(shutdown_signal()).await?;

    sampler.abort();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

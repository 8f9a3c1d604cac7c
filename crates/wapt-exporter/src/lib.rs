//! wapt-exporter: Prometheus exporter for the WAPT deployment server.
//!
//! Every scrape of the telemetry path runs the WAPT collector once against
//! the configured server and returns the resulting gauges:
//!
//! | Metric | Labels | Description |
//! |---|---|---|
//! | `wapt_up` | | 1 if the server answered its ping |
//! | `wapt_hosts` | `reachable`, `version` | hosts per reachability and agent version |
//! | `wapt_packages` | | packages in the local repository |

pub mod config;
pub mod handlers;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::{info, warn};

use wapt_inventory::{InventoryApi, InventoryClient};
use wapt_metrics::{CATALOG, WaptCollector, check_catalog};

pub use config::{Cli, ExporterConfig, log_directives};
pub use handlers::ScrapeState;

/// Build the exporter router serving the collector on `telemetry_path`.
pub fn build_router<C>(telemetry_path: &str, collector: Arc<WaptCollector<C>>) -> Router
where
    C: InventoryApi + 'static,
{
    Router::new()
        .route(telemetry_path, get(handlers::prometheus_metrics::<C>))
        .with_state(ScrapeState { collector })
}

/// Validate the metric catalog, bind the listener and serve until Ctrl-C.
pub async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    info!(
        listen_address = %config.listen_address,
        telemetry_path = %config.telemetry_path,
        wapt_api = %config.inventory.endpoint,
        wapt_user = %config.inventory.username,
        "WAPT exporter starting"
    );

    check_catalog(&CATALOG).context("failed to register WAPT collector")?;

    let client = Arc::new(InventoryClient::new(config.inventory.clone()));
    let collector = Arc::new(WaptCollector::new(client));
    let router = build_router(&config.telemetry_path, collector);

    let listener = TcpListener::bind(config.listen_address)
        .await
        .with_context(|| format!("failed to listen on {}", config.listen_address))?;
    info!(addr = %config.listen_address, "serving metrics");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("WAPT exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            // Without a signal handler the server just runs until killed.
            warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}

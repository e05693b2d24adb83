//! A minimal access server wired to live configuration reconciliation.
//!
//! Run with a configuration directory containing `config.toml` and any of the
//! other domain files:
//!
//! ```sh
//! cargo run --example access_server -- ./config
//! ```
//!
//! Edit any file while it runs; the matching domain reloads on its own.

use axum::Router;
use axum::routing::get;
use hotswap_reconcile::device::PeerTable;
use hotswap_reconcile::frontend::AxumFrontend;
use hotswap_reconcile::prelude::*;
use hotswap_reconcile::reconcile::LogLevelHook;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, reload};

#[tokio::main]
async fn main() -> Result<()> {
    let (filter, filter_handle) = reload::Layer::new(LevelFilter::INFO);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let log_hook: LogLevelHook = Arc::new(move |level| {
        if let Err(e) = filter_handle.reload(level) {
            eprintln!("failed to change log level: {}", e);
        }
    });

    let config_dir = std::env::args().nth(1).unwrap_or_else(|| "./config".to_string());
    let device = Arc::new(PeerTable::new());
    let router = Router::new().route("/version", get(|| async { env!("CARGO_PKG_VERSION") }));

    let coordinator = ReconciliationCoordinator::builder()
        .with_config_dir(&config_dir)
        .with_device(device.clone())
        .with_http_frontend(AxumFrontend::factory(router))
        .with_log_level_hook(log_hook)
        .build()?;

    let _listener = coordinator.subscribe(|domain| {
        tracing::info!(domain = %domain, "Domain reloaded");
    });

    coordinator.start().await?;
    tracing::info!(dir = %config_dir, "Access server running, press Ctrl+C to stop");

    let mut status = tokio::time::interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = status.tick() => {
                tracing::info!(
                    consoles = coordinator.peers(PeerCategory::Console).len(),
                    agents = coordinator.peers(PeerCategory::Agent).len(),
                    resource_dbs = coordinator.peers(PeerCategory::ResourceDb).len(),
                    registered = device.len(),
                    auth_services = coordinator.auth_services().len(),
                    source_ips = coordinator.source_ips().len(),
                    http = coordinator.is_http_running().await,
                    "Status"
                );
            }
        }
    }

    coordinator.shutdown().await;
    Ok(())
}

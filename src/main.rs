//! Main entry point for the whale-sentinel activity monitor.
//!
//! Wires the SQLite activity store, the price source and the scan
//! orchestrator together, then runs the monitoring loop until ctrl-c.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn, Level};
use whale_sentinel::monitor::{
    ActivityMonitor, MonitorConfig, SqliteActivityStore, StaticPriceTable,
};

const DEFAULT_DATABASE_URL: &str = "sqlite:whale_activity.db?mode=rwc";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting whale-sentinel activity monitor");

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    info!("Using activity store at {}", database_url);

    let store = Arc::new(SqliteActivityStore::connect(&database_url).await?);

    // Static table stands in for a live oracle; swap in
    // CoinGeckoPriceSource here to price against the real API.
    let prices = Arc::new(StaticPriceTable::new());

    let monitor = ActivityMonitor::new(store, prices, MonitorConfig::default());

    let (stop_sender, stop_receiver) = watch::channel(false);
    let monitor_handle = tokio::spawn(monitor.run(stop_receiver));

    tokio::signal::ctrl_c().await?;
    info!("Stop requested, shutting down after current scan");

    if stop_sender.send(true).is_err() {
        warn!("Monitor already stopped");
    }
    monitor_handle.await?;

    info!("whale-sentinel stopped");
    Ok(())
}

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// This is the main runtime for the multi-exchange order book
// snapshot collector.
//
// Responsibilities:
// - Initialize logging
// - Load configuration
// - Open (or create) the snapshot store
// - Start the metrics reporter
// - Run the collector loop until shutdown is requested
//

use std::fs;
use std::time::Duration;

use log::{info, warn};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use orderbook_rest_collector::collector::fetcher::SnapshotFetcher;
use orderbook_rest_collector::collector::runner::run_collector;
use orderbook_rest_collector::config::Config;
use orderbook_rest_collector::metrics::METRICS;
use orderbook_rest_collector::store::SqliteStore;

/// Cadence of the periodic metrics summary line.
const METRICS_REPORT_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --------------------------------------------------------
    // Logging
    //
    // Level routing is the operator's concern via RUST_LOG;
    // default to info so the collector is observable out of
    // the box.
    // --------------------------------------------------------
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("order book collector starting");

    // --------------------------------------------------------
    // Load configuration from disk
    //
    // The only required setting is the storage path. The
    // endpoint list defaults to the reference deployment when
    // the file does not override it.
    // --------------------------------------------------------
    let config: Config = load_config("config.json")?;

    // --------------------------------------------------------
    // Open the snapshot store
    //
    // Creates the database file and schema if absent. This is
    // the single long-lived storage handle; per-tick scoping
    // happens at the transaction level inside the sink.
    // --------------------------------------------------------
    let store = SqliteStore::connect(&config.storage.path).await?;

    let endpoints = config.enabled_endpoints();
    if endpoints.is_empty() {
        warn!("no endpoints enabled, collector will only commit empty batches");
    }

    // --------------------------------------------------------
    // Start metrics reporter (periodic, low-noise)
    // --------------------------------------------------------
    tokio::spawn(async {
        loop {
            sleep(METRICS_REPORT_INTERVAL).await;
            info!("[METRICS] {}", METRICS.summary());
        }
    });

    // --------------------------------------------------------
    // Shutdown signal handler (SIGINT + SIGTERM)
    //
    // Trips the cancellation token; the collector finishes any
    // cycle in flight and exits instead of starting another.
    // --------------------------------------------------------
    let cancel = CancellationToken::new();
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {},
                _ = sigterm.recv() => {},
            }
        }
        #[cfg(not(unix))]
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl+c");

        info!("received shutdown signal, draining");
        shutdown_cancel.cancel();
    });

    // --------------------------------------------------------
    // Run the collector loop (blocks until cancellation)
    // --------------------------------------------------------
    let fetcher = SnapshotFetcher::new();
    run_collector(&fetcher, &store, &endpoints, cancel).await;

    info!("shutdown complete");
    Ok(())
}

// ------------------------------------------------------------
// Configuration loader
// ------------------------------------------------------------
//
// Reads a JSON configuration file from disk and deserializes
// it into the strongly typed `Config` structure.
//
fn load_config(path: &str) -> anyhow::Result<Config> {
    let data = fs::read_to_string(path)?;
    let cfg = serde_json::from_str(&data)?;
    Ok(cfg)
}

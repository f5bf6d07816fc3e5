use std::sync::atomic::Ordering;

use anyhow::Result;
use chrono::Utc;
use futures_util::future::join_all;
use log::{error, info, warn};
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;

use crate::collector::fetcher::SnapshotFetcher;
use crate::metrics::METRICS;
use crate::schema::{Endpoint, OrderBookEntry};
use crate::store::SnapshotSink;
use crate::util::bytes_to_mib;

/// Pause between the end of one cycle and the start of the next.
pub const FETCH_INTERVAL: Duration = Duration::from_millis(5000);

/// Free space required on the storage volume before a batch commits.
pub const MIN_FREE_SPACE_BYTES: u64 = 100 * 1024 * 1024;

/// Runs the fetch-guard-commit cycle until cancelled.
///
/// This loop:
/// - Starts a cycle immediately on entry
/// - Sleeps `FETCH_INTERVAL` between cycles
/// - Exits only when `cancel` fires
///
/// GUARANTEES:
/// - A failed cycle never terminates the loop; the error is logged
///   and the next cycle runs after the normal interval
/// - Cancellation is honored before each cycle and during the sleep
/// - A cycle already in flight runs to completion; individual
///   fetches are short-lived, so draining is bounded in practice
///
/// RESPONSIBILITIES:
/// - Cycle scheduling
/// - Loop-level error containment
///
/// NOT RESPONSIBLE FOR:
/// - Per-endpoint failure handling (fetcher responsibility)
/// - Commit atomicity (sink responsibility)
///
pub async fn run_collector(
    fetcher: &SnapshotFetcher,
    sink: &dyn SnapshotSink,
    endpoints: &[Endpoint],
    cancel: CancellationToken,
) {
    info!(
        "collector started: {} endpoints, {} ms interval",
        endpoints.len(),
        FETCH_INTERVAL.as_millis()
    );

    while !cancel.is_cancelled() {
        match run_tick(fetcher, sink, endpoints).await {
            Ok(()) => {
                METRICS.ticks_completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                METRICS.ticks_failed.fetch_add(1, Ordering::Relaxed);
                error!("error fetching order books: {e:#}");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(FETCH_INTERVAL) => {}
        }
    }

    info!("collector stopped");
}

/// One fetch-guard-commit cycle.
///
/// Fans out one concurrent fetch per endpoint, waits for every one
/// of them to resolve (success or failure alike), then hands the
/// successful entries to the gated commit.
///
/// A failing endpoint contributes nothing; it never blocks or
/// cancels its siblings. A batch of any size 0..N is valid.
pub async fn run_tick(
    fetcher: &SnapshotFetcher,
    sink: &dyn SnapshotSink,
    endpoints: &[Endpoint],
) -> Result<()> {
    let results = join_all(endpoints.iter().map(|ep| fetcher.fetch(ep))).await;

    let batch: Vec<OrderBookEntry> = results.into_iter().filter_map(Result::ok).collect();

    commit_gated(sink, batch).await
}

/// Commits a batch if the storage volume has room for it.
///
/// Below `MIN_FREE_SPACE_BYTES` the batch is dropped whole: a
/// warning carries the measured value and the cycle ends without
/// touching storage. The next cycle re-fetches fresh data, so
/// nothing is retained for retry.
///
/// A sink failure propagates to the loop-level catch; the batch is
/// lost for this cycle.
pub async fn commit_gated(sink: &dyn SnapshotSink, batch: Vec<OrderBookEntry>) -> Result<()> {
    let free = sink.available_space().await?;

    if free < MIN_FREE_SPACE_BYTES {
        METRICS
            .commits_skipped_low_space
            .fetch_add(1, Ordering::Relaxed);
        warn!(
            "low disk space on storage volume: {} bytes ({} MiB) available, dropping batch of {} entries",
            free,
            bytes_to_mib(free),
            batch.len()
        );
        return Ok(());
    }

    sink.commit_batch(&batch).await?;

    METRICS.commits.fetch_add(1, Ordering::Relaxed);
    METRICS
        .entries_stored
        .fetch_add(batch.len(), Ordering::Relaxed);
    info!(
        "order books fetched and stored at {} ({} entries)",
        Utc::now(),
        batch.len()
    );

    Ok(())
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Global runtime metrics for the collector.
///
/// Purpose:
/// - Track fetch outcomes per tick
/// - Track tick and commit throughput
/// - Track guard activity (skipped commits)
///
/// Design:
/// - Lock-free (Atomics)
/// - Cheap to update
/// - Safe in async + multithreaded contexts
///
/// Counters are observability only. Nothing in the fetch or commit
/// path reads them back to make decisions.
#[derive(Default)]
pub struct RuntimeMetrics {
    // Fetch level
    pub fetches_ok: AtomicUsize,
    pub fetches_failed: AtomicUsize,

    // Tick level
    pub ticks_completed: AtomicUsize,
    pub ticks_failed: AtomicUsize,

    // Storage level
    pub commits: AtomicUsize,
    pub commits_skipped_low_space: AtomicUsize,
    pub entries_stored: AtomicUsize,
}

impl RuntimeMetrics {
    /// One-line summary for the periodic reporter.
    pub fn summary(&self) -> String {
        format!(
            "fetch_ok={} fetch_err={} ticks={} tick_err={} commits={} low_space_skips={} stored={}",
            self.fetches_ok.load(Ordering::Relaxed),
            self.fetches_failed.load(Ordering::Relaxed),
            self.ticks_completed.load(Ordering::Relaxed),
            self.ticks_failed.load(Ordering::Relaxed),
            self.commits.load(Ordering::Relaxed),
            self.commits_skipped_low_space.load(Ordering::Relaxed),
            self.entries_stored.load(Ordering::Relaxed),
        )
    }
}

/// Global metrics registry (singleton)
pub static METRICS: Lazy<Arc<RuntimeMetrics>> =
    Lazy::new(|| Arc::new(RuntimeMetrics::default()));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reflects_counter_state() {
        let metrics = RuntimeMetrics::default();
        metrics.fetches_ok.fetch_add(4, Ordering::Relaxed);
        metrics.commits.fetch_add(1, Ordering::Relaxed);
        metrics.entries_stored.fetch_add(4, Ordering::Relaxed);

        let line = metrics.summary();
        assert!(line.contains("fetch_ok=4"));
        assert!(line.contains("commits=1"));
        assert!(line.contains("stored=4"));
    }
}

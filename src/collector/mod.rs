/// Collector module
///
/// This module groups all logic responsible for:
/// - Fetching snapshots from the configured REST endpoints
/// - Scheduling the fetch-guard-commit cycle
/// - Routing collected batches to the snapshot sink
///
/// The collector layer acts as the orchestration layer between:
/// - The HTTP transport (reqwest)
/// - The storage sink (SnapshotSink implementations)
///
/// Design notes:
/// - Storage-specific logic MUST NOT live here
/// - Endpoint URLs are opaque; no per-exchange behavior exists
/// - All heavy lifting belongs to the fetcher or sink
pub mod fetcher;
pub mod runner;

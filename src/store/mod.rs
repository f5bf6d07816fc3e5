//! Snapshot persistence layer
//!
//! This module provides:
//! - The `SnapshotSink` capability trait the collector runtime
//!   talks to
//! - The SQLite-backed production implementation
//!
//! All storage-specific logic must live behind `SnapshotSink`.
//! The rest of the application must interact exclusively through
//! the trait.

pub mod sqlite;

pub use sqlite::SqliteStore;

use anyhow::Result;

use crate::schema::OrderBookEntry;

/// SnapshotSink is the abstraction layer between:
/// - The generic collector runtime
/// - The durable storage backend
///
/// DESIGN GOALS:
/// - Zero storage-specific logic outside this module
/// - The runtime decides *when* to persist, the sink decides *how*
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - One sink instance is shared across the process lifetime
///
#[async_trait::async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Persists one tick's batch as a single atomic unit.
    ///
    /// CONTRACT:
    /// - Either every entry in the batch is durably stored, or on
    ///   failure none are. Partial writes must not be observable.
    /// - An empty batch is a valid commit and must succeed.
    /// - Entries are never mutated by the sink.
    ///
    async fn commit_batch(&self, entries: &[OrderBookEntry]) -> Result<()>;

    /// Reports the free bytes available on the backing volume.
    ///
    /// Used by the pre-commit guard. The probe must be cheap enough
    /// to run once per tick.
    async fn available_space(&self) -> Result<u64>;
}

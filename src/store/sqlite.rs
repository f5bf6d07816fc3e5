use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::schema::OrderBookEntry;
use crate::store::SnapshotSink;

/// SQLite-backed snapshot store.
///
/// Responsibilities:
/// - Create the database file and schema if absent (startup only)
/// - Append one tick's entries inside a single transaction
/// - Probe free space on the volume holding the database
///
/// The pool is small on purpose: the collector commits at most one
/// batch at a time, so two connections cover the commit path plus
/// any ad-hoc inspection.
pub struct SqliteStore {
    pool: SqlitePool,
    volume_path: PathBuf,
}

impl SqliteStore {
    /// Opens (and if missing, creates) the database at `path`, then
    /// ensures the snapshot table exists.
    ///
    /// Creation-if-absent is the only schema management performed.
    /// There are no migrations.
    pub async fn connect(path: &str) -> Result<Self> {
        let db_path = Path::new(path);
        let existed = db_path.exists();

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open snapshot database at {}", path))?;

        // The free-space probe needs a path that exists even before
        // the first commit: the directory holding the database file.
        let volume_path = match db_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let store = Self { pool, volume_path };
        store.ensure_schema().await?;

        if existed {
            info!("snapshot database already exists at {}", path);
        } else {
            info!("snapshot database created at {}", path);
        }

        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS order_book_entries (
                id            TEXT PRIMARY KEY,
                exchange      TEXT NOT NULL,
                url           TEXT NOT NULL,
                timestamp_utc TEXT NOT NULL,
                result        TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("failed to create snapshot table")?;

        Ok(())
    }

    /// Number of stored entries. Inspection helper, not used on the
    /// collect path.
    pub async fn entry_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_book_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// All stored entries in insertion order. Inspection helper, not
    /// used on the collect path.
    pub async fn entries(&self) -> Result<Vec<OrderBookEntry>> {
        use sqlx::Row;

        let rows = sqlx::query(
            "SELECT id, exchange, url, timestamp_utc, result
             FROM order_book_entries ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderBookEntry {
                id: row.get("id"),
                exchange: row.get("exchange"),
                url: row.get("url"),
                timestamp: row.get("timestamp_utc"),
                result: row.get("result"),
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl SnapshotSink for SqliteStore {
    async fn commit_batch(&self, entries: &[OrderBookEntry]) -> Result<()> {
        // One transaction per tick: the batch lands whole or not at
        // all. The transaction is the per-tick storage scope; it is
        // acquired here and released on commit.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin snapshot transaction")?;

        for entry in entries {
            sqlx::query(
                "INSERT INTO order_book_entries (id, exchange, url, timestamp_utc, result)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&entry.id)
            .bind(&entry.exchange)
            .bind(&entry.url)
            .bind(entry.timestamp)
            .bind(&entry.result)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert snapshot for {}", entry.exchange))?;
        }

        tx.commit()
            .await
            .context("failed to commit snapshot batch")?;

        Ok(())
    }

    async fn available_space(&self) -> Result<u64> {
        // statvfs-style probe, effectively instant; no need to move
        // it off the async worker.
        let free = fs2::available_space(&self.volume_path).with_context(|| {
            format!(
                "failed to probe free space on {}",
                self.volume_path.display()
            )
        })?;
        Ok(free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::entry_id;

    fn temp_db_path() -> PathBuf {
        std::env::temp_dir().join(format!("orderbook-store-test-{}.db", entry_id()))
    }

    fn sample_entry(exchange: &str) -> OrderBookEntry {
        OrderBookEntry::record(exchange, "http://127.0.0.1/depth", "{}".to_string())
    }

    #[tokio::test]
    async fn connect_creates_database_and_schema() {
        let path = temp_db_path();
        let store = SqliteStore::connect(path.to_str().unwrap()).await.unwrap();

        assert!(path.exists());
        assert_eq!(store.entry_count().await.unwrap(), 0);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn connect_is_idempotent_across_restarts() {
        let path = temp_db_path();

        {
            let store = SqliteStore::connect(path.to_str().unwrap()).await.unwrap();
            store.commit_batch(&[sample_entry("Bitmex")]).await.unwrap();
        }

        // Second open must keep existing rows and not recreate the table.
        let store = SqliteStore::connect(path.to_str().unwrap()).await.unwrap();
        assert_eq!(store.entry_count().await.unwrap(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn commit_batch_persists_every_entry() {
        let path = temp_db_path();
        let store = SqliteStore::connect(path.to_str().unwrap()).await.unwrap();

        let batch = vec![
            sample_entry("Bitmex"),
            sample_entry("Bybit"),
            sample_entry("Deribit"),
        ];
        store.commit_batch(&batch).await.unwrap();

        assert_eq!(store.entry_count().await.unwrap(), 3);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn empty_batch_commit_succeeds() {
        let path = temp_db_path();
        let store = SqliteStore::connect(path.to_str().unwrap()).await.unwrap();

        store.commit_batch(&[]).await.unwrap();
        assert_eq!(store.entry_count().await.unwrap(), 0);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn duplicate_id_rolls_back_the_whole_batch() {
        let path = temp_db_path();
        let store = SqliteStore::connect(path.to_str().unwrap()).await.unwrap();

        let first = sample_entry("Bitmex");
        store.commit_batch(&[first.clone()]).await.unwrap();

        // Second batch: one fresh entry plus a primary-key clash. The
        // fresh entry must not survive the failed commit.
        let fresh = sample_entry("Bybit");
        let result = store.commit_batch(&[fresh, first]).await;
        assert!(result.is_err());
        assert_eq!(store.entry_count().await.unwrap(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn available_space_reports_nonzero_for_temp_volume() {
        let path = temp_db_path();
        let store = SqliteStore::connect(path.to_str().unwrap()).await.unwrap();

        let free = store.available_space().await.unwrap();
        assert!(free > 0);

        let _ = std::fs::remove_file(&path);
    }
}

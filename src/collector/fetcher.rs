use std::sync::atomic::Ordering;

use anyhow::{Result, bail};
use log::{error, info};
use reqwest::{Client, Response};

use crate::metrics::METRICS;
use crate::schema::{Endpoint, OrderBookEntry};

/// Upper bound on a stored response body.
///
/// Depth-unlimited order books from the reference endpoints run in
/// the hundreds of kilobytes; anything near this cap is a broken or
/// hostile response and is treated like any other failed fetch.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Fetches one order-book snapshot per endpoint over plain HTTP GET.
///
/// This component:
/// - Holds the single long-lived HTTP client shared by all fetches
/// - Treats any non-2xx status as a failed fetch
/// - Reads bodies chunk-wise under `MAX_BODY_BYTES`
/// - Stamps each successful snapshot at its own completion instant
///
/// CONTRACT:
/// - `fetch` never panics across the call boundary. Every failure
///   mode (connect error, timeout, status, oversized body) is
///   returned as one error kind carrying the cause, after being
///   logged here.
///
/// NOT RESPONSIBLE FOR:
/// - Retrying (the next tick re-fetches naturally)
/// - Parsing or validating payloads
/// - Deciding whether results get persisted
///
pub struct SnapshotFetcher {
    client: Client,
}

impl SnapshotFetcher {
    /// Creates a fetcher with transport defaults.
    ///
    /// No custom headers, no auth, no timeout override. Requests are
    /// stateless GETs, so the client is safely shared across all
    /// concurrent fetches and all ticks.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Fetches one snapshot and reports the outcome.
    ///
    /// Logs exactly one line per call: success (exchange, url) or
    /// failure (exchange, url, cause). The caller receives an
    /// explicit `Err` for failures and decides nothing beyond
    /// whether the entry joins the batch.
    pub async fn fetch(&self, endpoint: &Endpoint) -> Result<OrderBookEntry> {
        match self.fetch_snapshot(endpoint).await {
            Ok(entry) => {
                METRICS.fetches_ok.fetch_add(1, Ordering::Relaxed);
                info!(
                    "fetched {} order book from {}",
                    endpoint.exchange, endpoint.url
                );
                Ok(entry)
            }
            Err(e) => {
                METRICS.fetches_failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    "failed to fetch {} order book from {}: {e:#}",
                    endpoint.exchange, endpoint.url
                );
                Err(e)
            }
        }
    }

    async fn fetch_snapshot(&self, endpoint: &Endpoint) -> Result<OrderBookEntry> {
        let response = self
            .client
            .get(&endpoint.url)
            .send()
            .await?
            .error_for_status()?;

        let body = read_body_capped(response).await?;
        Ok(OrderBookEntry::record(&endpoint.exchange, &endpoint.url, body))
    }
}

impl Default for SnapshotFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the full response body as text, failing once it exceeds
/// `MAX_BODY_BYTES`.
///
/// Chunk-wise so an oversized response is dropped at the cap instead
/// of being buffered whole first.
async fn read_body_capped(mut response: Response) -> Result<String> {
    let mut buf: Vec<u8> = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        if buf.len() + chunk.len() > MAX_BODY_BYTES {
            bail!("response body exceeds {} byte cap", MAX_BODY_BYTES);
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

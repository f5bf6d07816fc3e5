use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::util::entry_id;

/// One configured fetch target.
///
/// Endpoints are loaded once at startup and never change afterwards.
/// The URL is treated as opaque: no exchange-specific request logic
/// exists anywhere in the pipeline.
///
/// DESIGN NOTES:
/// - Duplicate exchange names are not rejected. The reference
///   deployment never produces them and nothing downstream keys on
///   uniqueness.
///
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Endpoint {
    /// Exchange identifier (e.g. "Binance", "Deribit")
    pub exchange: String,

    /// Full REST URL returning an order book or ticker payload
    pub url: String,
}

// ------------------------------------------------------------
// Order book snapshot record
// ------------------------------------------------------------
//
// The single persisted record type of the whole system.
//
// One record per successful fetch. The response body is stored
// exactly as received, as text. Records are immutable after
// creation and are never deleted by this process (retention is
// an operator concern).
//
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderBookEntry {
    /// Random 128-bit identifier, hex encoded
    pub id: String,

    /// Exchange identifier, copied from the endpoint
    pub exchange: String,

    /// URL the snapshot was fetched from
    pub url: String,

    /// Completion instant of this record's own fetch (UTC)
    ///
    /// IMPORTANT:
    /// - This is NOT the tick start time. Fetches within one tick
    ///   run concurrently and finish at slightly different instants.
    pub timestamp: DateTime<Utc>,

    /// Raw response body, unparsed
    pub result: String,
}

impl OrderBookEntry {
    /// Builds a record for a snapshot that was just read to completion.
    ///
    /// Stamps a fresh id and the current UTC instant, so this must be
    /// called at fetch completion, not earlier.
    pub fn record(exchange: &str, url: &str, result: String) -> Self {
        Self {
            id: entry_id(),
            exchange: exchange.to_string(),
            url: url.to_string(),
            timestamp: Utc::now(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_copies_endpoint_fields_and_body() {
        let entry = OrderBookEntry::record(
            "Binance",
            "https://api.binance.com/api/v3/depth?symbol=BTCUSDT",
            "{\"bids\":[]}".to_string(),
        );

        assert_eq!(entry.exchange, "Binance");
        assert_eq!(entry.url, "https://api.binance.com/api/v3/depth?symbol=BTCUSDT");
        assert_eq!(entry.result, "{\"bids\":[]}");
        assert_eq!(entry.id.len(), 32);
    }

    #[test]
    fn records_get_distinct_ids() {
        let a = OrderBookEntry::record("A", "http://a", String::new());
        let b = OrderBookEntry::record("A", "http://a", String::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn timestamp_is_taken_at_creation() {
        let before = Utc::now();
        let entry = OrderBookEntry::record("A", "http://a", String::new());
        let after = Utc::now();

        assert!(entry.timestamp >= before);
        assert!(entry.timestamp <= after);
    }
}

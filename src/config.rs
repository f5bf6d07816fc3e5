use serde::Deserialize;

use crate::schema::Endpoint;

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// This is the top-level configuration structure loaded from
// `config.json`.
//
// It defines:
// - Storage settings (the only required external setting)
// - The fixed endpoint list polled on every tick
//
// The endpoint list is fixed at deployment: it is read once at
// startup and never reloaded.
//
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Configuration for the snapshot store
    pub storage: StorageConfig,

    /// List of endpoint configurations
    ///
    /// Defaults to the reference deployment's five exchange
    /// endpoints when omitted from the file.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EndpointConfig>,
}

impl Config {
    /// Returns the fetch targets for all enabled endpoints, in
    /// configuration order.
    pub fn enabled_endpoints(&self) -> Vec<Endpoint> {
        self.endpoints
            .iter()
            .filter(|e| e.enabled)
            .map(EndpointConfig::endpoint)
            .collect()
    }
}

// ------------------------------------------------------------
// Storage configuration
// ------------------------------------------------------------
//
// Defines where snapshots are persisted.
//
// Notes:
// - `path` is a SQLite database file location. The file and its
//   schema are created on startup if absent.
// - The free-space guard probes the volume holding this path.
//
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// SQLite database file path
    pub path: String,
}

// ------------------------------------------------------------
// Endpoint configuration
// ------------------------------------------------------------
//
// Configuration for a single polled endpoint.
//
// Each endpoint is fetched independently on every tick; disabling
// one never affects the others.
//
#[derive(Debug, Deserialize, Clone)]
pub struct EndpointConfig {
    /// Exchange identifier (e.g. "Bitmex", "Binance")
    pub exchange: String,

    /// Full REST URL for the order book or ticker payload
    pub url: String,

    /// Enables or disables this endpoint at startup
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl EndpointConfig {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            exchange: self.exchange.clone(),
            url: self.url.clone(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// The reference deployment's endpoint list.
///
/// These are the five public order-book / ticker REST endpoints the
/// collector archives when the configuration file does not override
/// them. URLs are opaque to the pipeline; depth and symbol choices
/// live entirely in the query strings.
fn default_endpoints() -> Vec<EndpointConfig> {
    let reference: [(&str, &str); 5] = [
        (
            "Bitmex",
            "https://www.bitmex.com/api/v1/orderBook/L2?symbol=XBTUSD&depth=0",
        ),
        (
            "Bybit",
            "https://api.bybit.com/v5/market/orderbook?category=linear&symbol=BTCUSDT&limit=10000",
        ),
        (
            "Deribit",
            "https://www.deribit.com/api/v2/public/get_order_book?instrument_name=BTC-PERPETUAL&depth=10000",
        ),
        (
            "Binance",
            "https://api.binance.com/api/v3/depth?symbol=BTCUSDT&limit=10000",
        ),
        (
            "LNMarkets",
            "https://api.lnmarkets.com/v2/futures/ticker",
        ),
    ];

    reference
        .into_iter()
        .map(|(exchange, url)| EndpointConfig {
            exchange: exchange.to_string(),
            url: url.to_string(),
            enabled: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_falls_back_to_reference_endpoints() {
        let cfg: Config =
            serde_json::from_str(r#"{ "storage": { "path": "orderbooks.db" } }"#).unwrap();

        assert_eq!(cfg.storage.path, "orderbooks.db");
        assert_eq!(cfg.endpoints.len(), 5);
        assert!(cfg.endpoints.iter().all(|e| e.enabled));
        assert_eq!(cfg.endpoints[0].exchange, "Bitmex");
        assert_eq!(cfg.endpoints[4].exchange, "LNMarkets");
    }

    #[test]
    fn explicit_endpoints_replace_the_default_list() {
        let cfg: Config = serde_json::from_str(
            r#"{
                "storage": { "path": "x.db" },
                "endpoints": [
                    { "exchange": "Kraken", "url": "https://api.kraken.com/0/public/Depth?pair=XBTUSD" },
                    { "exchange": "Bitfinex", "url": "https://api.bitfinex.com/v1/book/btcusd", "enabled": false }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.endpoints.len(), 2);
        assert!(cfg.endpoints[0].enabled);
        assert!(!cfg.endpoints[1].enabled);

        let enabled = cfg.enabled_endpoints();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].exchange, "Kraken");
    }

    #[test]
    fn missing_storage_section_is_rejected() {
        assert!(serde_json::from_str::<Config>("{}").is_err());
    }
}

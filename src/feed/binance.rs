//! Binance WebSocket trade feed

use super::FeedSource;
use crate::ws::{ConnectionState, WsClient, WsConfig, WsMessage};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::{mpsc, watch};

/// Binance USD-M futures WebSocket base URL
pub const BINANCE_WS_URL: &str = "wss://fstream.binance.com/ws";

/// Binance `<symbol>@trade` feed, one connection per symbol
pub struct BinanceFeed {
    base_config: WsConfig,
    states: Mutex<HashMap<String, watch::Receiver<ConnectionState>>>,
}

impl BinanceFeed {
    /// Create a feed against the given base URL with the given connection policy
    ///
    /// The URL in `base_config` is the stream root; the per-symbol path is appended.
    pub fn new(base_config: WsConfig) -> Self {
        Self {
            base_config,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Feed against the public Binance endpoint with default connection policy
    pub fn with_defaults() -> Self {
        Self::new(WsConfig::new(BINANCE_WS_URL))
    }

    /// Build the WebSocket URL for a symbol's trade stream
    fn build_ws_url(&self, symbol: &str) -> String {
        format!(
            "{}/{}@trade",
            self.base_config.url.trim_end_matches('/'),
            symbol.to_lowercase()
        )
    }
}

#[async_trait]
impl FeedSource for BinanceFeed {
    async fn subscribe(
        &self,
        symbol: &str,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<mpsc::Receiver<WsMessage>> {
        let mut config = self.base_config.clone();
        config.url = self.build_ws_url(symbol);

        tracing::info!(symbol = %symbol, url = %config.url, "Subscribing to Binance trade stream");

        let client = WsClient::new(config);
        self.states
            .lock()
            .insert(symbol.to_uppercase(), client.state());

        Ok(client.connect(shutdown))
    }

    fn connection_state(&self, symbol: &str) -> Option<ConnectionState> {
        self.states
            .lock()
            .get(&symbol.to_uppercase())
            .map(|rx| *rx.borrow())
    }
}

//! Trade feed module
//!
//! Raw trade events from Binance WebSocket streams, and their normalization
//! into canonical ticks.

mod binance;
mod normalizer;
mod types;

pub use binance::{BinanceFeed, BINANCE_WS_URL};
pub use normalizer::normalize_trade;
pub use types::{NormalizeError, Tick};

use crate::ws::{ConnectionState, WsMessage};
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

/// Source of raw trade events for a single instrument
///
/// Implementations own transport and reconnection; they deliver raw text frames
/// plus connection-status events and stop with [`WsMessage::Disconnected`] once
/// `shutdown` is set.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Subscribe to raw events for a symbol
    async fn subscribe(
        &self,
        symbol: &str,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<mpsc::Receiver<WsMessage>>;

    /// Latest connection state of a subscribed symbol, if the source tracks one
    fn connection_state(&self, _symbol: &str) -> Option<ConnectionState> {
        None
    }
}

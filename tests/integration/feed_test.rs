//! Integration tests for the trade feed and WebSocket client

use pairwatch::feed::{normalize_trade, BinanceFeed, FeedSource, NormalizeError};
use pairwatch::ws::{ConnectionState, WsConfig, WsMessage};
use std::time::Duration;
use tokio::sync::watch;

#[test]
fn test_normalize_binance_trade() {
    let raw = r#"{"e":"trade","E":1704067200123,"T":1704067200100,"s":"ETHUSDT","t":42,"p":"2250.55","q":"0.120","X":"MARKET","m":true}"#;
    let tick = normalize_trade(raw).unwrap();
    assert_eq!(tick.symbol, "ETHUSDT");
    assert_eq!(tick.time.timestamp_millis(), 1_704_067_200_100);
    assert_eq!(tick.price.to_string(), "2250.55");
}

#[test]
fn test_normalize_rejects_non_trade() {
    let raw = r#"{"e":"depthUpdate","E":1,"s":"ETHUSDT"}"#;
    assert!(matches!(
        normalize_trade(raw),
        Err(NormalizeError::UnsupportedEventType(_))
    ));
}

#[tokio::test]
async fn test_unreachable_feed_gives_up_after_limit() {
    let config = WsConfig::new("ws://127.0.0.1:1")
        .max_reconnects(2)
        .initial_delay(Duration::from_millis(10))
        .max_delay(Duration::from_millis(20))
        .connect_timeout(Duration::from_millis(200));
    let feed = BinanceFeed::new(config);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut rx = feed.subscribe("ethusdt", shutdown_rx).await.unwrap();

    let mut reconnects = 0;
    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(msg) = rx.recv().await {
            if let WsMessage::Reconnecting { .. } = msg {
                reconnects += 1;
            }
        }
    })
    .await;

    assert!(drained.is_ok(), "client should stop after the attempt limit");
    assert!(reconnects >= 1);
    assert_eq!(
        feed.connection_state("ETHUSDT"),
        Some(ConnectionState::Disconnected)
    );
}

#[tokio::test]
async fn test_shutdown_stops_reconnecting_feed() {
    let config = WsConfig::new("ws://127.0.0.1:1")
        .initial_delay(Duration::from_millis(50))
        .connect_timeout(Duration::from_millis(200));
    let feed = BinanceFeed::new(config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut rx = feed.subscribe("btcusdt", shutdown_rx).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(true).unwrap();

    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        while rx.recv().await.is_some() {}
    })
    .await;
    assert!(closed.is_ok());
}

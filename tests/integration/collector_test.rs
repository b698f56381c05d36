//! Collector driven by a scripted feed source

use async_trait::async_trait;
use pairwatch::analytics::{AnalyticsPipeline, Signal};
use pairwatch::collector::Collector;
use pairwatch::config::Config;
use pairwatch::data::StreamStore;
use pairwatch::feed::FeedSource;
use pairwatch::ws::WsMessage;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Replays fixed frames per symbol, then idles until shutdown
struct ScriptedFeed {
    frames: HashMap<String, Vec<String>>,
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn subscribe(
        &self,
        symbol: &str,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<mpsc::Receiver<WsMessage>> {
        let frames = self.frames.get(symbol).cloned().unwrap_or_default();
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let _ = tx.send(WsMessage::Connected).await;
            for frame in frames {
                let _ = tx.send(WsMessage::Text(frame)).await;
            }
            let _ = shutdown.wait_for(|stop| *stop).await;
            let _ = tx.send(WsMessage::Disconnected).await;
        });
        Ok(rx)
    }
}

fn trade(symbol: &str, secs: i64, price: &str) -> String {
    format!(
        r#"{{"e":"trade","E":{t},"T":{t},"s":"{symbol}","t":1,"p":"{price}","q":"1.0","m":false}}"#,
        t = 1_704_067_200_000 + secs * 1000
    )
}

#[tokio::test]
async fn test_collector_feeds_analytics() {
    let mut frames = HashMap::new();
    frames.insert(
        "AAAUSDT".to_string(),
        vec![
            trade("AAAUSDT", 0, "100"),
            trade("AAAUSDT", 1, "102"),
            r#"{"e":"kline","s":"AAAUSDT"}"#.to_string(),
            trade("AAAUSDT", 2, "101"),
        ],
    );
    frames.insert(
        "BBBUSDT".to_string(),
        vec![
            trade("BBBUSDT", 0, "100"),
            "{broken".to_string(),
            trade("BBBUSDT", 1, "99"),
            trade("BBBUSDT", 2, "98"),
        ],
    );

    let store = Arc::new(StreamStore::new());
    let handle = Collector::new(Arc::new(ScriptedFeed { frames }), store.clone())
        .start(&["AAAUSDT".to_string(), "BBBUSDT".to_string()])
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(2), async {
        while handle.stats().received < 8 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("collector should drain the scripted frames");

    let mut config: Config = toml::from_str(
        r#"
        [feed]
        symbol_a = "AAAUSDT"
        symbol_b = "BBBUSDT"
    "#,
    )
    .unwrap();
    config.analytics.window = 2;

    // Analytics reads the store while ingestion is still live
    let report = AnalyticsPipeline::from_config(store.clone(), &config.feed, &config.analytics)
        .unwrap()
        .run_pass();
    assert_eq!(
        report.spread.as_ready().unwrap().spread_values(),
        vec![0.0, 3.0, 3.0]
    );
    assert_eq!(report.signal.signal(), Signal::NoTrade);

    let (stats, _) = handle.shutdown().await;
    assert_eq!(stats.appended, 6);
    assert_eq!(stats.unsupported, 1);
    assert_eq!(stats.malformed, 1);
    assert_eq!(store.symbols(), vec!["AAAUSDT", "BBBUSDT"]);
}

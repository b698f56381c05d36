//! Ingestion driver
//!
//! One task per symbol pulls raw frames from the feed source, normalizes them and
//! appends to the stream store. Analytics never talks to these tasks; it only reads
//! the store.

mod types;

pub use types::CollectorStats;

use crate::data::{AppendOutcome, RecorderStats, StreamStore, TickRecorder};
use crate::feed::{normalize_trade, FeedSource, NormalizeError};
use crate::telemetry::{increment_counter, CounterMetric};
use crate::ws::{wait_for_shutdown, ConnectionState, WsMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use types::StatCounters;

/// Feed-to-store ingestion
pub struct Collector {
    feed: Arc<dyn FeedSource>,
    store: Arc<StreamStore>,
    recorder: Option<TickRecorder>,
}

impl Collector {
    pub fn new(feed: Arc<dyn FeedSource>, store: Arc<StreamStore>) -> Self {
        Self {
            feed,
            store,
            recorder: None,
        }
    }

    /// Also persist every stored tick
    pub fn with_recorder(mut self, recorder: TickRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Subscribe to every symbol and start ingesting
    pub async fn start(self, symbols: &[String]) -> anyhow::Result<CollectorHandle> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let counters = Arc::new(StatCounters::default());
        let recorder = self.recorder.map(Arc::new);

        let mut tasks = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = symbol.to_uppercase();
            let rx = match self.feed.subscribe(&symbol, shutdown_rx.clone()).await {
                Ok(rx) => rx,
                Err(e) => {
                    // Stop what already started before reporting
                    let _ = shutdown_tx.send(true);
                    for (_, task) in tasks {
                        let _ = task.await;
                    }
                    return Err(e.context(format!("Failed to subscribe to {}", symbol)));
                }
            };

            let ingest = SymbolIngest {
                symbol: symbol.clone(),
                store: self.store.clone(),
                recorder: recorder.clone(),
                counters: counters.clone(),
            };
            let task = tokio::spawn(ingest.run(rx, shutdown_rx.clone()));
            tasks.push((symbol, task));
        }

        tracing::info!(symbols = ?symbols, "Collector started");

        Ok(CollectorHandle {
            feed: self.feed,
            shutdown_tx,
            tasks,
            recorder,
            counters,
        })
    }
}

/// Running collector
pub struct CollectorHandle {
    feed: Arc<dyn FeedSource>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<(String, JoinHandle<()>)>,
    recorder: Option<Arc<TickRecorder>>,
    counters: Arc<StatCounters>,
}

impl CollectorHandle {
    pub fn stats(&self) -> CollectorStats {
        self.counters.snapshot()
    }

    /// Connection state per symbol, when the feed tracks it
    pub fn connection_states(&self) -> Vec<(String, Option<ConnectionState>)> {
        self.tasks
            .iter()
            .map(|(symbol, _)| (symbol.clone(), self.feed.connection_state(symbol)))
            .collect()
    }

    /// A receiver that flips to `true` when shutdown starts
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Stop ingestion, wait for in-flight appends, then flush the recorder
    pub async fn shutdown(self) -> (CollectorStats, Option<RecorderStats>) {
        let _ = self.shutdown_tx.send(true);

        for (symbol, task) in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(symbol = %symbol, error = %e, "Ingest task failed");
            }
        }

        let recorder_stats = match self.recorder.map(Arc::try_unwrap) {
            Some(Ok(recorder)) => Some(recorder.close().await),
            Some(Err(_)) => {
                tracing::warn!("Tick recorder still shared at shutdown, not flushed");
                None
            }
            None => None,
        };

        let stats = self.counters.snapshot();
        tracing::info!(?stats, "Collector stopped");
        (stats, recorder_stats)
    }
}

/// Per-symbol ingest loop state
struct SymbolIngest {
    symbol: String,
    store: Arc<StreamStore>,
    recorder: Option<Arc<TickRecorder>>,
    counters: Arc<StatCounters>,
}

impl SymbolIngest {
    async fn run(self, mut rx: mpsc::Receiver<WsMessage>, mut shutdown: watch::Receiver<bool>) {
        loop {
            let msg = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => break,
                msg = rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };

            match msg {
                WsMessage::Text(text) => self.ingest(&text).await,
                WsMessage::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => self.ingest(&text).await,
                    Err(_) => {
                        StatCounters::bump(&self.counters.received);
                        self.malformed("binary frame is not UTF-8");
                    }
                },
                WsMessage::Connected => {
                    tracing::info!(symbol = %self.symbol, "Feed connected");
                }
                WsMessage::Disconnected => {
                    tracing::warn!(symbol = %self.symbol, "Feed disconnected");
                }
                WsMessage::Reconnecting { attempt } => {
                    StatCounters::bump(&self.counters.reconnects);
                    increment_counter(CounterMetric::Reconnects, 1);
                    tracing::warn!(symbol = %self.symbol, attempt, "Feed reconnecting");
                }
            }
        }

        tracing::debug!(symbol = %self.symbol, "Ingest loop stopped");
    }

    async fn ingest(&self, raw: &str) {
        StatCounters::bump(&self.counters.received);

        let tick = match normalize_trade(raw) {
            Ok(tick) => tick,
            Err(NormalizeError::UnsupportedEventType(kind)) => {
                StatCounters::bump(&self.counters.unsupported);
                increment_counter(CounterMetric::UnsupportedEvents, 1);
                tracing::trace!(symbol = %self.symbol, kind = %kind, "Skipping non-trade event");
                return;
            }
            Err(NormalizeError::MalformedEvent(reason)) => {
                self.malformed(&reason);
                return;
            }
        };

        let recorded = self.recorder.as_ref().map(|_| tick.clone());
        match self.store.append(tick) {
            AppendOutcome::Appended => {
                StatCounters::bump(&self.counters.appended);
                increment_counter(CounterMetric::TicksAppended, 1);
                if let (Some(recorder), Some(tick)) = (&self.recorder, recorded) {
                    if let Err(e) = recorder.record(tick).await {
                        tracing::warn!(symbol = %self.symbol, error = %e, "Failed to record tick");
                    }
                }
            }
            AppendOutcome::DroppedOutOfOrder => {
                StatCounters::bump(&self.counters.out_of_order);
                increment_counter(CounterMetric::OutOfOrderDropped, 1);
            }
        }
    }

    fn malformed(&self, reason: &str) {
        StatCounters::bump(&self.counters.malformed);
        increment_counter(CounterMetric::MalformedEvents, 1);
        tracing::debug!(symbol = %self.symbol, reason = %reason, "Dropping malformed event");
    }
}

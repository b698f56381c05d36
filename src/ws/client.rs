//! WebSocket client with automatic reconnection
//!
//! The connection loop is an explicit state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> (error) -> Backoff -> Connecting ...
//!                      |                                   |
//!                      +----------- shutdown --------------+--> Disconnected
//! ```
//!
//! Every wait (handshake, backoff sleep, read) also listens for the shutdown
//! signal, so cancellation never waits on the network.

use super::types::{Backoff, ConnectionState, WsConfig, WsError, WsMessage};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Reusable WebSocket client with automatic reconnection and ping/pong handling
pub struct WsClient {
    config: WsConfig,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Create a new client with just a URL using default config
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(WsConfig::new(url))
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Watch connection state transitions
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Connect and return a receiver for messages
    ///
    /// Spawns a background task that owns the connection, reconnects with capped
    /// exponential backoff and keeps the link alive with pings. The task ends, after
    /// emitting [`WsMessage::Disconnected`], when `shutdown` flips to `true`, when the
    /// receiver is dropped, or when a finite attempt limit is exhausted.
    pub fn connect(&self, shutdown: watch::Receiver<bool>) -> mpsc::Receiver<WsMessage> {
        let (tx, rx) = mpsc::channel(1024);
        let config = self.config.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::run_connection_loop(config, tx, state, shutdown).await {
                tracing::error!(error = %e, "WebSocket connection loop failed");
            }
        });

        rx
    }

    /// Run the connection loop with automatic reconnection
    async fn run_connection_loop(
        config: WsConfig,
        tx: mpsc::Sender<WsMessage>,
        state: Arc<watch::Sender<ConnectionState>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), WsError> {
        let mut backoff = Backoff::new(config.initial_reconnect_delay, config.max_reconnect_delay);

        let result = loop {
            if is_shutdown(&shutdown) {
                break Ok(());
            }

            state.send_replace(ConnectionState::Connecting);

            match Self::connect_and_stream(&config, &tx, &state, &mut backoff, &mut shutdown).await
            {
                Ok(()) => {
                    tracing::info!(url = %config.url, "WebSocket connection closed");
                    break Ok(());
                }
                Err(e) => {
                    let (attempt, delay) = backoff.next_delay();
                    tracing::warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "WebSocket connection lost, backing off"
                    );

                    // Check max reconnects (0 = infinite)
                    if config.max_reconnect_attempts > 0 && attempt >= config.max_reconnect_attempts
                    {
                        tracing::error!("Max reconnection attempts reached");
                        break Err(WsError::MaxReconnectsExceeded);
                    }

                    if tx.is_closed() {
                        tracing::info!("Receiver dropped, stopping reconnection");
                        break Ok(());
                    }

                    state.send_replace(ConnectionState::Backoff {
                        attempt,
                        delay_ms: delay.as_millis() as u64,
                    });
                    let _ = tx.send(WsMessage::Reconnecting { attempt }).await;

                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = wait_for_shutdown(&mut shutdown) => {}
                    }
                }
            }
        };

        state.send_replace(ConnectionState::Disconnected);
        let _ = tx.send(WsMessage::Disconnected).await;
        result
    }

    /// Connect to WebSocket and stream messages
    ///
    /// `Ok(())` means the session ended on purpose (shutdown or receiver gone);
    /// anything the peer or network does wrong is an `Err` and gets retried.
    async fn connect_and_stream(
        config: &WsConfig,
        tx: &mpsc::Sender<WsMessage>,
        state: &watch::Sender<ConnectionState>,
        backoff: &mut Backoff,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), WsError> {
        tracing::info!(url = %config.url, "Connecting to WebSocket");

        let handshake = timeout(config.connect_timeout, connect_async(&config.url));
        let (ws_stream, _response) = tokio::select! {
            res = handshake => match res {
                Ok(Ok(pair)) => pair,
                Ok(Err(e)) => return Err(WsError::ConnectionFailed(e.to_string())),
                Err(_) => return Err(WsError::ConnectTimeout(config.connect_timeout)),
            },
            _ = wait_for_shutdown(shutdown) => return Ok(()),
        };

        let (mut write, mut read) = ws_stream.split();

        tracing::info!(url = %config.url, "WebSocket connected");
        state.send_replace(ConnectionState::Connected);
        backoff.reset();

        if tx.send(WsMessage::Connected).await.is_err() {
            return Ok(());
        }

        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut waiting_for_pong = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if tx.send(WsMessage::Text(text)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            if tx.send(WsMessage::Binary(data)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            waiting_for_pong = false;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "Received close frame");
                            return Err(WsError::ConnectionFailed("closed by peer".into()));
                        }
                        Some(Err(e)) => {
                            return Err(WsError::ConnectionFailed(e.to_string()));
                        }
                        None => {
                            return Err(WsError::ConnectionFailed(
                                "Stream ended unexpectedly".into(),
                            ));
                        }
                        _ => {}
                    }
                }

                _ = ping_interval.tick() => {
                    if waiting_for_pong {
                        return Err(WsError::PongTimeout);
                    }
                    write.send(Message::Ping(vec![])).await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    waiting_for_pong = true;
                }

                _ = wait_for_shutdown(shutdown) => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
            }
        }
    }
}

/// True once shutdown was requested or its sender is gone
pub(crate) fn is_shutdown(rx: &watch::Receiver<bool>) -> bool {
    *rx.borrow() || rx.has_changed().is_err()
}

/// Resolve once shutdown is requested; a dropped sender counts as a request
pub(crate) async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

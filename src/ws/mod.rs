//! WebSocket client library
//!
//! Provides a reusable WebSocket client with automatic reconnection,
//! ping/pong handling, capped backoff and cooperative shutdown.

mod client;
mod types;

pub use client::WsClient;
pub(crate) use client::{is_shutdown, wait_for_shutdown};
pub use types::{Backoff, ConnectionState, WsConfig, WsError, WsMessage};

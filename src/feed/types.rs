//! Price feed types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single normalized trade observation for one instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Exchange trade time (never local receipt time)
    pub time: DateTime<Utc>,
    /// Trading symbol, upper case (e.g., "BTCUSDT")
    pub symbol: String,
    /// Trade price
    pub price: Decimal,
    /// Trade quantity
    pub quantity: Decimal,
}

impl Tick {
    /// Create a tick, upper-casing the symbol
    pub fn new(
        time: DateTime<Utc>,
        symbol: impl Into<String>,
        price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            time,
            symbol: symbol.into().to_uppercase(),
            price,
            quantity,
        }
    }
}

/// Reasons a raw feed event cannot become a [`Tick`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Required field missing, non-numeric or out of range
    #[error("Malformed event: {0}")]
    MalformedEvent(String),
    /// Event is valid but not a trade
    #[error("Unsupported event type: {0}")]
    UnsupportedEventType(String),
}

//! Trade event normalization
//!
//! Turns a raw Binance trade payload into a canonical [`Tick`]. Pure transform:
//! the caller decides whether a failure is counted, logged or ignored.

use super::{NormalizeError, Tick};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Event type discriminator for trades
const TRADE_EVENT: &str = "trade";

/// Normalize a raw trade event payload
pub fn normalize_trade(raw: &str) -> Result<Tick, NormalizeError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| NormalizeError::MalformedEvent(format!("invalid json: {}", e)))?;

    // Combined streams wrap the event as {"stream": ..., "data": {...}}
    let event = match value.get("data") {
        Some(Value::Object(inner)) => inner,
        _ => value
            .as_object()
            .ok_or_else(|| NormalizeError::MalformedEvent("payload is not an object".into()))?,
    };

    let event_type = event
        .get("e")
        .and_then(Value::as_str)
        .ok_or_else(|| NormalizeError::MalformedEvent("missing event type".into()))?;
    if event_type != TRADE_EVENT {
        return Err(NormalizeError::UnsupportedEventType(event_type.to_string()));
    }

    let trade_time = event
        .get("T")
        .and_then(Value::as_i64)
        .ok_or_else(|| NormalizeError::MalformedEvent("missing trade time".into()))?;
    let time = Utc
        .timestamp_millis_opt(trade_time)
        .single()
        .ok_or_else(|| NormalizeError::MalformedEvent(format!("bad trade time {}", trade_time)))?;

    let symbol = event
        .get("s")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| NormalizeError::MalformedEvent("missing symbol".into()))?;

    let price = positive_decimal(event, "p")?;
    let quantity = positive_decimal(event, "q")?;

    Ok(Tick::new(time, symbol.trim(), price, quantity))
}

/// Binance sends decimals as strings; plain JSON numbers are accepted too
fn positive_decimal(event: &Map<String, Value>, key: &str) -> Result<Decimal, NormalizeError> {
    let parsed = match event.get(key) {
        Some(Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    };

    match parsed {
        Some(d) if d > Decimal::ZERO => Ok(d),
        Some(d) => Err(NormalizeError::MalformedEvent(format!(
            "field '{}' must be positive, got {}",
            key, d
        ))),
        None => Err(NormalizeError::MalformedEvent(format!(
            "field '{}' missing or non-numeric",
            key
        ))),
    }
}

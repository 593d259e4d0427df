//! WebSocket and REST message types.
//!
//! Every frame on the futures stream shares one envelope:
//!
//! ```json
//! { "time": 1615366381, "channel": "futures.order_book_update",
//!   "event": "update", "error": null, "result": { ... } }
//! ```
//!
//! The envelope is decoded first; its `result` is decoded into a channel
//! specific type afterwards.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{deserialize_decimal, Price, SequenceId, Size, TimestampMs};
use crate::error::ParseError;

/// Stream channel, keyed by the suffix after `futures.`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// Incremental order book updates (`futures.order_book_update`)
    OrderBookUpdate,
    /// Best bid/ask (`futures.book_ticker`)
    BookTicker,
    /// Public trades (`futures.trades`)
    Trades,
    /// Candles (`futures.candlesticks`)
    Candlesticks,
    /// Contract statistics including funding (`futures.tickers`)
    Tickers,
    /// Anything else
    Other(String),
}

impl Channel {
    /// Map a channel name (with or without the `futures.` prefix)
    pub fn from_name(name: &str) -> Self {
        let suffix = name.split_once('.').map_or(name, |(_, rest)| rest);
        match suffix {
            "order_book_update" => Channel::OrderBookUpdate,
            "book_ticker" => Channel::BookTicker,
            "trades" => Channel::Trades,
            "candlesticks" => Channel::Candlesticks,
            "tickers" => Channel::Tickers,
            other => Channel::Other(other.to_string()),
        }
    }
}

/// Envelope shared by every stream frame
#[derive(Debug, Clone, Deserialize)]
pub struct WsEnvelope {
    /// Server time in seconds
    #[serde(default)]
    pub time: Option<i64>,
    /// Full channel name, e.g. `futures.order_book_update`
    #[serde(default)]
    pub channel: Option<String>,
    /// Event kind (`subscribe`, `unsubscribe`, `update`, `all`)
    #[serde(default)]
    pub event: Option<String>,
    /// Error object, `null` on success
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    /// Channel specific payload
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

impl WsEnvelope {
    /// Decode an envelope from a raw text frame
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The channel this frame belongs to
    pub fn channel(&self) -> Option<Channel> {
        self.channel.as_deref().map(Channel::from_name)
    }

    /// Whether this is a subscription acknowledgement
    pub fn is_ack(&self) -> bool {
        matches!(self.event.as_deref(), Some("subscribe" | "unsubscribe"))
    }

    /// The exchange error attached to this frame, if any
    pub fn exchange_error(&self) -> Option<&serde_json::Value> {
        self.error.as_ref().filter(|e| !e.is_null())
    }

    /// Server time in milliseconds (0 when absent)
    pub fn time_ms(&self) -> TimestampMs {
        self.time
            .and_then(|t| u64::try_from(t).ok())
            .map_or(0, |t| t.saturating_mul(1000))
    }

    /// The raw `result` payload
    pub fn result(&self) -> Result<&serde_json::Value, ParseError> {
        self.result
            .as_ref()
            .filter(|r| !r.is_null())
            .ok_or_else(|| ParseError::MissingResult {
                channel: self.channel.clone().unwrap_or_default(),
            })
    }

    /// Decode the `result` payload into a typed value
    pub fn decode_result<T: DeserializeOwned>(&self) -> Result<T, ParseError> {
        Ok(T::deserialize(self.result()?)?)
    }
}

/// One `{p, s}` price level entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelUpdate {
    /// Price
    #[serde(rename = "p", deserialize_with = "deserialize_decimal")]
    pub price: Price,
    /// New aggregate size; zero deletes the level
    #[serde(rename = "s", deserialize_with = "deserialize_decimal")]
    pub size: Size,
}

/// `result` of a `futures.order_book_update` frame
#[derive(Debug, Clone, Deserialize)]
pub struct BookUpdateResult {
    /// Event time (Unix ms)
    #[serde(rename = "t")]
    pub timestamp_ms: TimestampMs,
    /// Contract, e.g. `BTC_USDT`
    #[serde(rename = "s")]
    pub symbol: String,
    /// First update id in this batch
    #[serde(rename = "U")]
    pub first_seq: SequenceId,
    /// Last update id in this batch
    #[serde(rename = "u")]
    pub last_seq: SequenceId,
    /// Bid level changes, in venue order
    #[serde(rename = "b", default)]
    pub bids: Vec<LevelUpdate>,
    /// Ask level changes, in venue order
    #[serde(rename = "a", default)]
    pub asks: Vec<LevelUpdate>,
}

/// Response of `GET /futures/{settle}/order_book?with_id=true`
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotResponse {
    /// Update id the snapshot corresponds to
    pub id: SequenceId,
    /// Response generation time (Unix seconds, fractional)
    #[serde(default)]
    pub current: Option<f64>,
    /// Last book change time (Unix seconds, fractional)
    #[serde(default)]
    pub update: Option<f64>,
    /// Bid levels, best first
    #[serde(default)]
    pub bids: Vec<LevelUpdate>,
    /// Ask levels, best first
    #[serde(default)]
    pub asks: Vec<LevelUpdate>,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const BOOK_UPDATE: &str = r#"{
        "time": 1615366381,
        "channel": "futures.order_book_update",
        "event": "update",
        "error": null,
        "result": {
            "t": 1615366381417,
            "s": "BTC_USD",
            "U": 2517661101,
            "u": 2517661113,
            "b": [{"p": "54672.1", "s": 0}, {"p": "54664.5", "s": 58794}],
            "a": [{"p": "54743.6", "s": 0}, {"p": "54742", "s": 95}]
        }
    }"#;

    #[test]
    fn test_book_update_deserialization() {
        let envelope = WsEnvelope::parse(BOOK_UPDATE).unwrap();
        assert_eq!(envelope.channel(), Some(Channel::OrderBookUpdate));
        assert!(envelope.exchange_error().is_none());
        assert!(!envelope.is_ack());

        let update: BookUpdateResult = envelope.decode_result().unwrap();
        assert_eq!(update.symbol, "BTC_USD");
        assert_eq!(update.first_seq, 2517661101);
        assert_eq!(update.last_seq, 2517661113);
        assert_eq!(update.timestamp_ms, 1615366381417);
        assert_eq!(update.bids[1].price, dec!(54664.5));
        assert_eq!(update.bids[1].size, dec!(58794));
        assert_eq!(update.asks[0].size, dec!(0));
    }

    #[test]
    fn test_snapshot_deserialization() {
        let json = r#"{
            "id": 123456,
            "current": 1623898993.123,
            "update": 1623898993.121,
            "asks": [{"p": "1.52", "s": 100}, {"p": "1.53", "s": 40}],
            "bids": [{"p": "1.17", "s": 150}, {"p": "1.16", "s": 203}]
        }"#;

        let snapshot: SnapshotResponse = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.id, 123456);
        assert_eq!(snapshot.asks.len(), 2);
        assert_eq!(snapshot.bids[0].price, dec!(1.17));
        assert_eq!(snapshot.bids[1].size, dec!(203));
    }

    #[test]
    fn test_channel_mapping() {
        assert_eq!(Channel::from_name("futures.trades"), Channel::Trades);
        assert_eq!(Channel::from_name("futures.tickers"), Channel::Tickers);
        assert_eq!(Channel::from_name("book_ticker"), Channel::BookTicker);
        assert_eq!(
            Channel::from_name("futures.liquidates"),
            Channel::Other("liquidates".to_string())
        );
    }

    #[test]
    fn test_subscribe_ack_and_error() {
        let json = r#"{"time": 1, "channel": "futures.trades", "event": "subscribe",
                       "error": {"code": 2, "message": "unknown contract"}, "result": null}"#;
        let envelope = WsEnvelope::parse(json).unwrap();
        assert!(envelope.is_ack());
        assert!(envelope.exchange_error().is_some());
        assert!(matches!(
            envelope.result(),
            Err(ParseError::MissingResult { .. })
        ));
    }

    #[test]
    fn test_malformed_price_is_rejected() {
        let json = BOOK_UPDATE.replace("54664.5", "54x64.5");
        let envelope = WsEnvelope::parse(&json).unwrap();
        assert!(envelope.decode_result::<BookUpdateResult>().is_err());
    }
}

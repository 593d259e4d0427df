//! Wire types for Gate.io futures streams and REST responses.
//!
//! - [`messages`] - WebSocket envelope, order book updates and depth snapshots
//! - [`market`] - Stateless payloads (tickers, trades, candles, funding)

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::ParseError;

pub mod market;
pub mod messages;

pub use market::{Candle, Funding, Ticker, Trade, TradeSide};
pub use messages::{BookUpdateResult, Channel, LevelUpdate, SnapshotResponse, WsEnvelope};

/// Price of a level, as an exact decimal
///
/// Gate.io sends prices as strings (`"54672.1"`). Parsing them into
/// `Decimal` keeps level keys exact, so a removal always hits the level it
/// names.
pub type Price = Decimal;

/// Aggregate size resting at a level (contracts)
pub type Size = Decimal;

/// Venue-assigned order book update id
pub type SequenceId = u64;

/// Timestamp in milliseconds since Unix epoch
pub type TimestampMs = u64;

/// Parse a decimal from its textual form.
///
/// Accepts plain (`"0.0001"`) and scientific (`"1e-4"`) notation.
pub fn parse_decimal(field: &'static str, text: &str) -> Result<Decimal, ParseError> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ParseError::InvalidDecimal {
            field,
            value: text.to_string(),
        })
}

struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number or numeric string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        parse_decimal("value", v).map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    // Floats go through their shortest textual form so `0.1` stays `0.1`.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        self.visit_str(&v.to_string())
    }
}

/// Deserialize a decimal from a JSON string, integer or float
pub(crate) fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DecimalVisitor)
}

/// Deserialize helper that treats `null` and empty strings as `None`
pub(crate) fn deserialize_optional_decimal<'de, D>(
    deserializer: D,
) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(other) => deserialize_decimal(other).map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Level {
        #[serde(deserialize_with = "deserialize_decimal")]
        s: Decimal,
    }

    #[derive(Deserialize)]
    struct Rate {
        #[serde(default, deserialize_with = "deserialize_optional_decimal")]
        rate: Option<Decimal>,
    }

    #[test]
    fn test_decimal_from_string_integer_and_float() {
        let l: Level = serde_json::from_str(r#"{"s": "54664.5"}"#).unwrap();
        assert_eq!(l.s, dec!(54664.5));

        let l: Level = serde_json::from_str(r#"{"s": 58794}"#).unwrap();
        assert_eq!(l.s, dec!(58794));

        let l: Level = serde_json::from_str(r#"{"s": 0.1}"#).unwrap();
        assert_eq!(l.s, dec!(0.1));

        let l: Level = serde_json::from_str(r#"{"s": -108}"#).unwrap();
        assert_eq!(l.s, dec!(-108));
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        assert!(serde_json::from_str::<Level>(r#"{"s": "12abc"}"#).is_err());
        assert!(serde_json::from_str::<Level>(r#"{"s": true}"#).is_err());
    }

    #[test]
    fn test_optional_decimal() {
        let r: Rate = serde_json::from_str(r#"{"rate": ""}"#).unwrap();
        assert_eq!(r.rate, None);
        let r: Rate = serde_json::from_str(r#"{"rate": null}"#).unwrap();
        assert_eq!(r.rate, None);
        let r: Rate = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(r.rate, None);
        let r: Rate = serde_json::from_str(r#"{"rate": "-0.000114"}"#).unwrap();
        assert_eq!(r.rate, Some(dec!(-0.000114)));
    }

    #[test]
    fn test_parse_decimal_scientific() {
        assert_eq!(parse_decimal("rate", "1e-4").unwrap(), dec!(0.0001));
        let err = parse_decimal("rate", "n/a").unwrap_err();
        assert!(err.to_string().contains("rate"));
    }
}

//! Stateless market data payloads.
//!
//! Tickers, trades, candles and funding updates carry no ordering contract.
//! Each parser is a pure function from a decoded [`WsEnvelope`] to typed
//! values.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::messages::WsEnvelope;
use super::{
    deserialize_decimal, deserialize_optional_decimal, Price, SequenceId, Size, TimestampMs,
};
use crate::error::ParseError;

/// Aggressor side of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeSide {
    /// Buyer was the taker
    Buy,
    /// Seller was the taker
    Sell,
}

/// Best bid/ask from `futures.book_ticker`
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    /// Contract
    pub symbol: String,
    /// Best bid price
    pub bid: Price,
    /// Size at best bid
    pub bid_size: Size,
    /// Best ask price
    pub ask: Price,
    /// Size at best ask
    pub ask_size: Size,
    /// Order book update id this ticker reflects
    pub update_id: Option<SequenceId>,
    /// Event time (Unix ms)
    pub timestamp_ms: TimestampMs,
}

#[derive(Deserialize)]
struct BookTickerResult {
    #[serde(default)]
    t: Option<TimestampMs>,
    #[serde(default)]
    u: Option<SequenceId>,
    s: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    b: Decimal,
    #[serde(rename = "B", default, deserialize_with = "deserialize_optional_decimal")]
    bid_size: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_decimal")]
    a: Decimal,
    #[serde(rename = "A", default, deserialize_with = "deserialize_optional_decimal")]
    ask_size: Option<Decimal>,
}

impl Ticker {
    /// Parse a `futures.book_ticker` frame
    pub fn from_envelope(envelope: &WsEnvelope) -> Result<Self, ParseError> {
        let r: BookTickerResult = envelope.decode_result()?;
        Ok(Self {
            symbol: r.s,
            bid: r.b,
            bid_size: r.bid_size.unwrap_or_default(),
            ask: r.a,
            ask_size: r.ask_size.unwrap_or_default(),
            update_id: r.u,
            timestamp_ms: r.t.unwrap_or_else(|| envelope.time_ms()),
        })
    }
}

/// A public trade from `futures.trades`
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    /// Contract
    pub symbol: String,
    /// Taker side
    pub side: TradeSide,
    /// Absolute traded size
    pub amount: Size,
    /// Execution price
    pub price: Price,
    /// Execution time (Unix ms)
    pub timestamp_ms: TimestampMs,
    /// Exchange trade id
    pub id: String,
}

#[derive(Deserialize)]
struct TradeResult {
    #[serde(deserialize_with = "deserialize_decimal")]
    size: Decimal,
    id: serde_json::Value,
    #[serde(default)]
    create_time: Option<u64>,
    #[serde(default)]
    create_time_ms: Option<TimestampMs>,
    #[serde(deserialize_with = "deserialize_decimal")]
    price: Decimal,
    contract: String,
}

impl Trade {
    /// Parse every trade in a `futures.trades` frame
    ///
    /// A negative size marks a sell.
    pub fn from_envelope(envelope: &WsEnvelope) -> Result<Vec<Self>, ParseError> {
        decode_list::<TradeResult>(envelope)?
            .into_iter()
            .map(|r| -> Result<Self, ParseError> {
                let id = match r.id {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                Ok(Self {
                    symbol: r.contract,
                    side: if r.size.is_sign_negative() {
                        TradeSide::Sell
                    } else {
                        TradeSide::Buy
                    },
                    amount: r.size.abs(),
                    price: r.price,
                    timestamp_ms: match (r.create_time_ms, r.create_time) {
                        (Some(ms), _) => ms,
                        (None, Some(secs)) => secs_to_ms("create_time", secs)?,
                        (None, None) => envelope.time_ms(),
                    },
                    id,
                })
            })
            .collect()
    }
}

/// A candle from `futures.candlesticks`
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    /// Contract
    pub symbol: String,
    /// Normalised interval (`1m`, `4h`, `1w`, ...)
    pub interval: String,
    /// Candle open time (Unix ms)
    pub start_ms: TimestampMs,
    /// Candle close time (Unix ms), 100ms before the next candle starts
    pub stop_ms: TimestampMs,
    /// Open price
    pub open: Price,
    /// Close price
    pub close: Price,
    /// High price
    pub high: Price,
    /// Low price
    pub low: Price,
    /// Traded volume
    pub volume: Size,
    /// Frame time (Unix ms)
    pub timestamp_ms: TimestampMs,
}

#[derive(Deserialize)]
struct CandleResult {
    t: u64,
    #[serde(deserialize_with = "deserialize_decimal")]
    v: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    c: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    h: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    l: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    o: Decimal,
    n: String,
}

/// Length of a candle interval such as `10s`, `15m`, `4h`, `3d` or `1w`, in seconds
pub fn interval_secs(interval: &str) -> Result<u64, ParseError> {
    let unknown = || ParseError::UnknownInterval(interval.to_string());
    let (split, _) = interval.char_indices().last().ok_or_else(unknown)?;
    let (count, unit) = interval.split_at(split);
    let count: u64 = count.parse().map_err(|_| unknown())?;
    let unit_secs = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 604_800,
        _ => return Err(unknown()),
    };
    count.checked_mul(unit_secs).ok_or_else(unknown)
}

fn secs_to_ms(field: &'static str, secs: u64) -> Result<TimestampMs, ParseError> {
    secs.checked_mul(1000)
        .ok_or(ParseError::OutOfRange { field, value: secs })
}

impl Candle {
    /// Parse every candle in a `futures.candlesticks` frame
    ///
    /// The candle name is `{interval}_{contract}`; `7d` is reported as `1w`.
    pub fn from_envelope(envelope: &WsEnvelope) -> Result<Vec<Self>, ParseError> {
        decode_list::<CandleResult>(envelope)?
            .into_iter()
            .map(|r| -> Result<Self, ParseError> {
                let (interval, symbol) = r
                    .n
                    .split_once('_')
                    .ok_or_else(|| ParseError::UnknownInterval(r.n.clone()))?;
                let interval = if interval == "7d" { "1w" } else { interval };
                let start_ms = secs_to_ms("t", r.t)?;
                let length_ms = secs_to_ms("n", interval_secs(interval)?)?;
                let stop_ms = start_ms
                    .checked_add(length_ms)
                    .ok_or(ParseError::OutOfRange {
                        field: "t",
                        value: r.t,
                    })?
                    .saturating_sub(100);
                Ok(Self {
                    symbol: symbol.to_string(),
                    interval: interval.to_string(),
                    start_ms,
                    stop_ms,
                    open: r.o,
                    close: r.c,
                    high: r.h,
                    low: r.l,
                    volume: r.v,
                    timestamp_ms: envelope.time_ms(),
                })
            })
            .collect()
    }
}

/// Funding state from `futures.tickers`
#[derive(Debug, Clone, PartialEq)]
pub struct Funding {
    /// Contract
    pub symbol: String,
    /// Mark price
    pub mark_price: Price,
    /// Current funding rate, `None` when the venue sends an empty value
    pub rate: Option<Decimal>,
    /// Indicative rate for the next period
    pub predicted_rate: Option<Decimal>,
    /// Frame time (Unix ms)
    pub timestamp_ms: TimestampMs,
}

#[derive(Deserialize)]
struct TickersResult {
    contract: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    mark_price: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    funding_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    funding_rate_indicative: Option<Decimal>,
}

impl Funding {
    /// Parse every contract entry in a `futures.tickers` frame
    pub fn from_envelope(envelope: &WsEnvelope) -> Result<Vec<Self>, ParseError> {
        Ok(decode_list::<TickersResult>(envelope)?
            .into_iter()
            .map(|r| Self {
                symbol: r.contract,
                mark_price: r.mark_price,
                rate: r.funding_rate,
                predicted_rate: r.funding_rate_indicative,
                timestamp_ms: envelope.time_ms(),
            })
            .collect())
    }
}

/// Decode a `result` that is either a list of entries or a single entry
fn decode_list<T: DeserializeOwned>(envelope: &WsEnvelope) -> Result<Vec<T>, ParseError> {
    match envelope.result()? {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| T::deserialize(item).map_err(ParseError::from))
            .collect(),
        single => Ok(vec![T::deserialize(single)?]),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_book_ticker() {
        let json = r#"{"time": 1615366379, "channel": "futures.book_ticker", "event": "update",
            "error": null, "result": {"t": 1615366379123, "u": 2517661076, "s": "BTC_USD",
            "b": "54696.6", "B": 37000, "a": "54696.7", "A": 47061}}"#;
        let ticker = Ticker::from_envelope(&WsEnvelope::parse(json).unwrap()).unwrap();

        assert_eq!(ticker.symbol, "BTC_USD");
        assert_eq!(ticker.bid, dec!(54696.6));
        assert_eq!(ticker.ask_size, dec!(47061));
        assert_eq!(ticker.update_id, Some(2517661076));
        assert_eq!(ticker.timestamp_ms, 1615366379123);
    }

    #[test]
    fn test_trades_sign_gives_side() {
        let json = r#"{"channel": "futures.trades", "event": "update", "time": 1541503698,
            "result": [
                {"size": -108, "id": 27753479, "create_time": 1545136464,
                 "create_time_ms": 1545136464123, "price": "96.4", "contract": "BTC_USD"},
                {"size": 3, "id": 27753480, "create_time": 1545136465,
                 "price": "96.5", "contract": "BTC_USD"}
            ]}"#;
        let trades = Trade::from_envelope(&WsEnvelope::parse(json).unwrap()).unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].side, TradeSide::Sell);
        assert_eq!(trades[0].amount, dec!(108));
        assert_eq!(trades[0].id, "27753479");
        assert_eq!(trades[0].timestamp_ms, 1545136464123);
        assert_eq!(trades[1].side, TradeSide::Buy);
        assert_eq!(trades[1].timestamp_ms, 1545136465000);
    }

    #[test]
    fn test_candles() {
        let json = r#"{"time": 1542162490, "channel": "futures.candlesticks", "event": "update",
            "error": null, "result": [
                {"t": 1545129300, "v": 27525555, "c": "95.4", "h": "96.9", "l": "89.5",
                 "o": "94.3", "n": "1m_BTC_USD"},
                {"t": 1545129300, "v": 10, "c": "95.4", "h": "96.9", "l": "89.5",
                 "o": "94.3", "n": "7d_BTC_USD"}
            ]}"#;
        let candles = Candle::from_envelope(&WsEnvelope::parse(json).unwrap()).unwrap();

        assert_eq!(candles[0].symbol, "BTC_USD");
        assert_eq!(candles[0].interval, "1m");
        assert_eq!(candles[0].start_ms, 1545129300000);
        assert_eq!(candles[0].stop_ms, 1545129359900);
        assert_eq!(candles[0].high, dec!(96.9));
        assert_eq!(candles[1].interval, "1w");
        assert_eq!(candles[1].stop_ms - candles[1].start_ms, 604_800_000 - 100);
    }

    #[test]
    fn test_funding() {
        let json = r#"{"time": 1541659086, "channel": "futures.tickers", "event": "update",
            "error": null, "result": [
                {"contract": "BTC_USD", "last": "118.4", "funding_rate": "-0.000114",
                 "funding_rate_indicative": "0.01875", "mark_price": "118.35"},
                {"contract": "ETH_USD", "funding_rate": "", "mark_price": "9.1"}
            ]}"#;
        let funding = Funding::from_envelope(&WsEnvelope::parse(json).unwrap()).unwrap();

        assert_eq!(funding[0].rate, Some(dec!(-0.000114)));
        assert_eq!(funding[0].predicted_rate, Some(dec!(0.01875)));
        assert_eq!(funding[0].timestamp_ms, 1541659086000);
        assert_eq!(funding[1].rate, None);
        assert_eq!(funding[1].predicted_rate, None);
    }

    #[test]
    fn test_oversized_times_are_parse_errors() {
        let candle = |t: &str, n: &str| {
            let json = format!(
                r#"{{"time": 1, "channel": "futures.candlesticks", "event": "update",
                "result": [{{"t": {t}, "v": 1, "c": "1", "h": "1", "l": "1", "o": "1", "n": "{n}"}}]}}"#
            );
            Candle::from_envelope(&WsEnvelope::parse(&json).unwrap())
        };

        assert!(matches!(
            candle("1545129300", "99999999999999999w_BTC_USD"),
            Err(ParseError::UnknownInterval(_))
        ));
        assert!(matches!(
            candle("18446744073709551", "1w_BTC_USD"),
            Err(ParseError::OutOfRange { field: "t", .. })
        ));
        assert!(matches!(
            candle("18446744073709551615", "1m_BTC_USD"),
            Err(ParseError::OutOfRange { field: "t", .. })
        ));

        let trade = r#"{"time": 1, "channel": "futures.trades", "event": "update",
            "result": [{"size": 1, "id": 1, "create_time": 18446744073709552,
            "price": "96.4", "contract": "BTC_USD"}]}"#;
        assert!(matches!(
            Trade::from_envelope(&WsEnvelope::parse(trade).unwrap()),
            Err(ParseError::OutOfRange {
                field: "create_time",
                ..
            })
        ));
    }

    #[test]
    fn test_interval_secs() {
        assert_eq!(interval_secs("10s").unwrap(), 10);
        assert_eq!(interval_secs("4h").unwrap(), 14_400);
        assert_eq!(interval_secs("3d").unwrap(), 259_200);
        assert!(interval_secs("").is_err());
        assert!(interval_secs("1y").is_err());
        assert!(interval_secs("xm").is_err());
        assert!(interval_secs("99999999999999999w").is_err());
    }
}

//! Error types for the gateio-book crate.
//!
//! This module defines the errors that can surface while mirroring a Gate.io
//! futures order book: malformed stream messages ([`ParseError`]), failed
//! depth snapshot requests ([`FetchError`]) and configuration problems.
//!
//! Sequence gaps are not errors: they are reported through
//! [`SyncOutcome::Reset`](crate::orderbook::SyncOutcome::Reset).

use thiserror::Error;

/// The main error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// A stream message or REST payload could not be decoded
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Fetching a depth snapshot failed
    #[error("snapshot fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Invalid configuration (bad environment variable, bad URL)
    #[error("configuration error: {0}")]
    Config(String),
}

/// A message that could not be turned into typed values.
///
/// Parse failures never touch book state: the message is dropped before any
/// level is mutated.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON syntax or structure did not match the expected shape
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A numeric field could not be read as an exact decimal
    #[error("invalid decimal in `{field}`: {value:?}")]
    InvalidDecimal {
        /// Field name
        field: &'static str,
        /// Raw text that failed to parse
        value: String,
    },

    /// A level carried a negative size
    #[error("negative size {size} at price {price}")]
    NegativeSize {
        /// Price of the offending level
        price: rust_decimal::Decimal,
        /// Size that was received
        size: rust_decimal::Decimal,
    },

    /// A batch claimed a sequence range that ends before it starts
    #[error("inverted sequence range U={first} > u={last}")]
    InvertedRange {
        /// First sequence id (`U`)
        first: u64,
        /// Last sequence id (`u`)
        last: u64,
    },

    /// The envelope carried no `result` payload
    #[error("message on `{channel}` has no result payload")]
    MissingResult {
        /// Channel the message arrived on
        channel: String,
    },

    /// Candle name did not start with a known interval
    #[error("unknown candle interval {0:?}")]
    UnknownInterval(String),

    /// A time or interval field does not fit in milliseconds
    #[error("`{field}` out of range: {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Value that was received
        value: u64,
    },
}

/// Failure to obtain a depth snapshot from the REST API.
///
/// Fatal for the current resync attempt only; retry and backoff belong to
/// the caller.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error label from the API body (if provided)
        label: Option<String>,
        /// Error message
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limited{}", retry_hint(.retry_after_secs))]
    RateLimited {
        /// Retry after this many seconds
        retry_after_secs: Option<u64>,
    },

    /// The response body was not a valid snapshot
    #[error("malformed snapshot payload: {0}")]
    Malformed(#[from] ParseError),

    /// The request URL could not be built
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs
        .map(|secs| format!(", retry after {secs}s"))
        .unwrap_or_default()
}

impl FetchError {
    /// HTTP status code, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::RateLimited { .. } => Some(429),
            FetchError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = Error::Fetch(FetchError::Status {
            status: 400,
            label: Some("INVALID_PARAM_VALUE".to_string()),
            message: "Bad request".to_string(),
        });
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("Bad request"));
    }

    #[test]
    fn test_rate_limited_display() {
        let err = FetchError::RateLimited {
            retry_after_secs: Some(3),
        };
        assert!(err.to_string().contains("retry after 3s"));
        assert!(err.is_client_error());
        assert!(!err.is_server_error());

        let err = FetchError::RateLimited {
            retry_after_secs: None,
        };
        assert_eq!(err.to_string(), "rate limited");
    }

    #[test]
    fn test_server_error_classification() {
        let err = FetchError::Status {
            status: 503,
            label: None,
            message: "maintenance".to_string(),
        };
        assert!(err.is_server_error());
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_parse_error_wraps_into_crate_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = ParseError::from(json_err).into();
        assert!(matches!(err, Error::Parse(ParseError::Json(_))));
    }

    #[test]
    fn test_inverted_range_display() {
        let err = ParseError::InvertedRange { first: 9, last: 4 };
        assert!(err.to_string().contains("U=9"));
        assert!(err.to_string().contains("u=4"));
    }
}

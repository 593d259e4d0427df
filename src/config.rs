//! Configuration for the Gate.io futures book mirror.
//!
//! This module provides the [`Config`] struct selecting the API environment,
//! the settlement currency, the snapshot depth and the reset policy applied
//! when a sequence gap is detected.

use std::time::Duration;

use crate::error::Error;

/// API environment (live or testnet)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Production environment
    #[default]
    Live,
    /// Futures testnet
    Testnet,
}

impl Environment {
    /// Get the base URL for REST API
    pub fn rest_base_url(&self) -> &'static str {
        match self {
            Environment::Live => "https://api.gateio.ws/api/v4",
            Environment::Testnet => "https://fx-api-testnet.gateio.ws/api/v4",
        }
    }

    /// Get the WebSocket URL prefix (the settle currency is appended)
    pub fn websocket_url(&self) -> &'static str {
        match self {
            Environment::Live => "wss://fx-ws.gateio.ws/v4/ws/",
            Environment::Testnet => "wss://fx-ws-testnet.gateio.ws/v4/ws/",
        }
    }
}

/// Which books are cleared when a sequence gap is detected on one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetScope {
    /// Every tracked symbol is cleared and must resynchronize
    #[default]
    Global,
    /// Only the symbol that gapped is cleared
    PerSymbol,
}

/// Configuration for the book mirror
///
/// # Example
///
/// ```rust
/// use gateio_book::config::{Config, Environment, ResetScope};
///
/// let config = Config::new()
///     .with_environment(Environment::Testnet)
///     .with_settle("btc")
///     .with_depth_limit(50)
///     .with_reset_scope(ResetScope::PerSymbol);
///
/// assert_eq!(config.depth_limit(), 50);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// API environment
    environment: Environment,

    /// Settlement currency path segment (`usdt`, `btc`)
    settle: String,

    /// Number of levels requested per side in a depth snapshot
    depth_limit: u32,

    /// HTTP request timeout
    timeout: Duration,

    /// Reset blast radius on a detected gap
    reset_scope: ResetScope,
}

impl Config {
    /// Create a configuration with default settings
    ///
    /// Live environment, `usdt` settlement, 100 levels, 10 second timeout
    /// and a global reset scope.
    pub fn new() -> Self {
        Self {
            environment: Environment::default(),
            settle: "usdt".to_string(),
            depth_limit: 100,
            timeout: Duration::from_secs(10),
            reset_scope: ResetScope::default(),
        }
    }

    /// Build a configuration from environment variables
    ///
    /// Reads `GATEIO_ENV` (`live` or `testnet`), `GATEIO_SETTLE`,
    /// `GATEIO_DEPTH` and `GATEIO_TIMEOUT_SECS`. Unset variables keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::new();

        if let Some(env) = lookup("GATEIO_ENV") {
            config.environment = match env.to_lowercase().as_str() {
                "live" | "" => Environment::Live,
                "testnet" => Environment::Testnet,
                other => return Err(Error::Config(format!("unknown GATEIO_ENV {other:?}"))),
            };
        }

        if let Some(settle) = lookup("GATEIO_SETTLE") {
            if settle.is_empty() {
                return Err(Error::Config("GATEIO_SETTLE is empty".to_string()));
            }
            config.settle = settle.to_lowercase();
        }

        if let Some(depth) = lookup("GATEIO_DEPTH") {
            config.depth_limit = depth
                .parse()
                .map_err(|_| Error::Config(format!("GATEIO_DEPTH is not a number: {depth:?}")))?;
        }

        if let Some(secs) = lookup("GATEIO_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::Config(format!("GATEIO_TIMEOUT_SECS is not a number: {secs:?}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Set the API environment
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the settlement currency
    #[must_use]
    pub fn with_settle(mut self, settle: impl Into<String>) -> Self {
        self.settle = settle.into();
        self
    }

    /// Set the snapshot depth limit
    #[must_use]
    pub fn with_depth_limit(mut self, depth_limit: u32) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    /// Set the HTTP request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the reset scope used on sequence gaps
    #[must_use]
    pub fn with_reset_scope(mut self, reset_scope: ResetScope) -> Self {
        self.reset_scope = reset_scope;
        self
    }

    /// Get the environment
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Get the settlement currency
    pub fn settle(&self) -> &str {
        &self.settle
    }

    /// Get the snapshot depth limit
    pub fn depth_limit(&self) -> u32 {
        self.depth_limit
    }

    /// Get the REST API base URL
    pub fn rest_base_url(&self) -> &'static str {
        self.environment.rest_base_url()
    }

    /// Get the WebSocket URL for the configured settle currency
    pub fn websocket_url(&self) -> String {
        format!("{}{}", self.environment.websocket_url(), self.settle)
    }

    /// Get the timeout duration
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the reset scope
    pub fn reset_scope(&self) -> ResetScope {
        self.reset_scope
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert_eq!(config.environment(), Environment::Live);
        assert_eq!(config.settle(), "usdt");
        assert_eq!(config.depth_limit(), 100);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.reset_scope(), ResetScope::Global);
    }

    #[test]
    fn test_testnet_environment() {
        let config = Config::new().with_environment(Environment::Testnet);
        assert!(config.rest_base_url().contains("testnet"));
        assert_eq!(
            config.websocket_url(),
            "wss://fx-ws-testnet.gateio.ws/v4/ws/usdt"
        );
    }

    #[test]
    fn test_builder_pattern() {
        let config = Config::new()
            .with_settle("btc")
            .with_depth_limit(20)
            .with_timeout(Duration::from_secs(3))
            .with_reset_scope(ResetScope::PerSymbol);

        assert_eq!(config.settle(), "btc");
        assert_eq!(config.depth_limit(), 20);
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.reset_scope(), ResetScope::PerSymbol);
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("GATEIO_ENV", "TESTNET"),
            ("GATEIO_SETTLE", "BTC"),
            ("GATEIO_DEPTH", "50"),
            ("GATEIO_TIMEOUT_SECS", "4"),
        ]))
        .unwrap();

        assert_eq!(config.environment(), Environment::Testnet);
        assert_eq!(config.settle(), "btc");
        assert_eq!(config.depth_limit(), 50);
        assert_eq!(config.timeout(), Duration::from_secs(4));
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = Config::from_lookup(lookup_from(&[("GATEIO_DEPTH", "lots")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("GATEIO_ENV", "staging")])).unwrap_err();
        assert!(err.to_string().contains("staging"));
    }
}

//! HTTP REST client for the Gate.io futures API.
//!
//! Only public market data endpoints are used, so requests are unsigned.
//!
//! # Example
//!
//! ```rust,no_run
//! use gateio_book::client::RestClient;
//! use gateio_book::Config;
//!
//! # async fn example() -> Result<(), gateio_book::error::FetchError> {
//! let config = Config::new();
//! let rest = RestClient::new(&config)?;
//!
//! let snapshot = rest.order_book("usdt", "BTC_USDT", 100).await?;
//! println!("snapshot id {}", snapshot.id);
//! # Ok(())
//! # }
//! ```

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use url::Url;

use crate::config::Config;
use crate::error::{FetchError, ParseError};
use crate::types::SnapshotResponse;

/// HTTP client for the Gate.io REST API
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    /// Create a new REST client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Self::with_base_url(config, config.rest_base_url())
    }

    /// Create a client against an explicit base URL (mirrors, local test servers)
    pub fn with_base_url(config: &Config, base_url: impl Into<String>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the request URL for `path` with query parameters
    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, FetchError> {
        let url = Url::parse_with_params(&format!("{}{}", self.base_url, path), query)?;
        Ok(url)
    }

    /// Make a GET request to the API
    ///
    /// # Arguments
    ///
    /// * `path` - API path (without base URL)
    /// * `query` - Query string parameters
    ///
    /// # Returns
    ///
    /// Deserialized response body
    pub async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.url(path, query)?;
        tracing::debug!(%url, "GET");

        let response = self.client.get(url).send().await?;

        self.handle_response(response).await
    }

    /// Fetch a depth snapshot with its update id
    ///
    /// `GET /futures/{settle}/order_book?contract=..&limit=..&with_id=true`
    pub async fn order_book(
        &self,
        settle: &str,
        contract: &str,
        limit: u32,
    ) -> Result<SnapshotResponse, FetchError> {
        let path = format!("/futures/{settle}/order_book");
        self.get(
            &path,
            &[
                ("contract", contract.to_string()),
                ("limit", limit.to_string()),
                ("with_id", "true".to_string()),
            ],
        )
        .await
    }

    /// Handle the HTTP response, checking for errors
    async fn handle_response<T>(&self, response: reqwest::Response) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();

        // Check for rate limiting
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());

            return Err(FetchError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        // Check for errors
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &body));
        }

        // Deserialize successful response
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(ParseError::from(e)))
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Gate.io error bodies look like `{"label": "CONTRACT_NOT_FOUND", "message": "..."}`
fn error_from_body(status: u16, body: &str) -> FetchError {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    let label = field("label");
    let message = field("message")
        .or_else(|| field("detail"))
        .or_else(|| label.clone())
        .unwrap_or_else(|| body.to_string());

    FetchError::Status {
        status,
        label,
        message,
    }
}

//! Depth snapshots: fetching them and turning them into books.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::book::SymbolBook;
use super::levels::Side;
use crate::client::RestClient;
use crate::config::Config;
use crate::error::{FetchError, ParseError};
use crate::types::{LevelUpdate, SnapshotResponse};

/// Anything that can produce a fresh depth snapshot for a contract.
///
/// The REST-backed [`SnapshotLoader`] is the production implementation;
/// tests and replays plug in their own.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch a snapshot for `symbol`
    ///
    /// The returned book is in
    /// [`AwaitingBridge`](super::SyncState::AwaitingBridge) with its cursor at
    /// the snapshot id.
    async fn fetch_snapshot(&self, symbol: &str) -> Result<SymbolBook, FetchError>;
}

/// Loads depth snapshots from the Gate.io REST API.
#[derive(Debug, Clone)]
pub struct SnapshotLoader {
    rest: RestClient,
    settle: String,
    depth_limit: u32,
}

impl SnapshotLoader {
    /// Create a loader from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Ok(Self::with_client(RestClient::new(config)?, config))
    }

    /// Create a loader around an existing REST client
    pub fn with_client(rest: RestClient, config: &Config) -> Self {
        Self {
            rest,
            settle: config.settle().to_string(),
            depth_limit: config.depth_limit(),
        }
    }

    /// Settlement currency used in request paths
    pub fn settle(&self) -> &str {
        &self.settle
    }

    /// Levels requested per side
    pub fn depth_limit(&self) -> u32 {
        self.depth_limit
    }

    /// Fetch the raw snapshot response for `symbol`
    pub async fn fetch_response(&self, symbol: &str) -> Result<SnapshotResponse, FetchError> {
        self.rest
            .order_book(&self.settle, symbol, self.depth_limit)
            .await
    }

    /// Build a book from a snapshot response
    ///
    /// Zero-size levels are skipped, a negative size rejects the whole
    /// snapshot. The book's cursor is the snapshot id and it awaits its
    /// bridge batch.
    pub fn build_book(
        symbol: impl Into<String>,
        response: SnapshotResponse,
    ) -> Result<SymbolBook, ParseError> {
        let mut book = SymbolBook::new(symbol, response.id);
        fill(&mut book, Side::Bid, response.bids)?;
        fill(&mut book, Side::Ask, response.asks)?;
        Ok(book)
    }
}

fn fill(book: &mut SymbolBook, side: Side, levels: Vec<LevelUpdate>) -> Result<(), ParseError> {
    let map = book.side_mut(side);
    for level in levels {
        if level.size < Decimal::ZERO {
            return Err(ParseError::NegativeSize {
                price: level.price,
                size: level.size,
            });
        }
        map.insert(level.price, level.size);
    }
    Ok(())
}

#[async_trait]
impl SnapshotSource for SnapshotLoader {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<SymbolBook, FetchError> {
        let response = self.fetch_response(symbol).await?;
        let book = Self::build_book(symbol, response)?;
        let (bids, asks) = book.num_levels();
        tracing::debug!(
            symbol,
            sequence_id = book.last_sequence_id(),
            bids,
            asks,
            "snapshot fetched"
        );
        Ok(book)
    }
}

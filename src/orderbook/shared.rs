//! Thread-safe read view of the latest books.
//!
//! [`SharedBooks`] is a [`BookSink`]: hand it to the coordinator (or the feed
//! handler) and clone it into as many reader tasks as needed. Readers take a
//! `parking_lot::RwLock` read guard for the duration of a query only.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::book::SymbolBook;
use super::levels::Side;
use super::manager::{BookSink, BookUpdate};
use crate::feed::FeedSink;
use crate::types::{Price, SequenceId, Size};

/// Shared copy of every synced book, updated from book events.
///
/// # Example
///
/// ```rust,no_run
/// use gateio_book::orderbook::SharedBooks;
///
/// let books = SharedBooks::new();
/// let reader = books.clone();
///
/// // pass `books` as the sink, query `reader` from anywhere:
/// if let Some((price, size)) = reader.best_bid("BTC_USDT") {
///     println!("Best bid: {size} @ {price}");
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedBooks {
    inner: Arc<RwLock<FxHashMap<String, SymbolBook>>>,
}

impl SharedBooks {
    /// Create an empty view
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of a book
    ///
    /// Returns a cloned copy for safe reading without holding locks.
    pub fn get_orderbook(&self, symbol: &str) -> Option<SymbolBook> {
        self.inner.read().get(symbol).cloned()
    }

    /// Get best bid for a contract
    pub fn best_bid(&self, symbol: &str) -> Option<(Price, Size)> {
        self.inner.read().get(symbol).and_then(SymbolBook::best_bid)
    }

    /// Get best ask for a contract
    pub fn best_ask(&self, symbol: &str) -> Option<(Price, Size)> {
        self.inner.read().get(symbol).and_then(SymbolBook::best_ask)
    }

    /// Get mid price for a contract
    pub fn mid_price(&self, symbol: &str) -> Option<Price> {
        self.inner.read().get(symbol).and_then(SymbolBook::mid_price)
    }

    /// Get spread for a contract
    pub fn spread(&self, symbol: &str) -> Option<Price> {
        self.inner.read().get(symbol).and_then(SymbolBook::spread)
    }

    /// Last update id seen for a contract
    pub fn sequence_id(&self, symbol: &str) -> Option<SequenceId> {
        self.inner
            .read()
            .get(symbol)
            .map(SymbolBook::last_sequence_id)
    }

    /// All contracts with a book, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.inner.read().keys().cloned().collect();
        symbols.sort_unstable();
        symbols
    }

    /// Number of books
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if the view holds no book
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl BookSink for SharedBooks {
    fn on_update(&mut self, update: BookUpdate<'_>) {
        let mut books = self.inner.write();
        match books.get_mut(update.book.symbol()) {
            Some(copy) if copy.last_sequence_id() <= update.sequence_id => {
                // Replay the recorded changes instead of cloning the whole book
                for side in [Side::Bid, Side::Ask] {
                    let levels = copy.side_mut(side);
                    for &(price, size) in update.delta.side(side) {
                        levels.insert(price, size);
                    }
                }
                copy.advance(update.sequence_id);
            }
            _ => {
                books.insert(update.book.symbol().to_string(), update.book.clone());
            }
        }
    }

    fn on_snapshot(&mut self, book: &SymbolBook) {
        self.inner
            .write()
            .insert(book.symbol().to_string(), book.clone());
    }

    fn on_reset(&mut self, symbols: &[String]) {
        let mut books = self.inner.write();
        for symbol in symbols {
            books.remove(symbol);
        }
    }
}

impl FeedSink for SharedBooks {}

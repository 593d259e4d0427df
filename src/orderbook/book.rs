//! Core per-symbol order book.
//!
//! A [`SymbolBook`] pairs the two [`PriceLevelMap`]s of one contract with its
//! synchronization cursor: the last update id folded into the book and
//! whether continuity with the live stream has been established.

use rust_decimal::Decimal;

use super::levels::{PriceLevelMap, Side};
use crate::types::{Price, SequenceId, Size};

/// Synchronization state of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Snapshot loaded, no live batch confirmed contiguous yet
    AwaitingBridge,
    /// Continuity established, batches are applied in order
    Synced,
}

/// Local mirror of one contract's order book.
///
/// # Design Decisions
///
/// 1. **Decimal prices**: Prices and sizes are `rust_decimal::Decimal`, so
///    levels match exactly and no float drift can split one level in two.
///
/// 2. **BTreeMap per side**: Sorted price levels with O(log n) operations
///    and best-first iteration.
///
/// 3. **Sequence cursor**: `last_sequence_id` and `sync_state` drive the
///    gap detection in [`SequenceValidator`](super::SequenceValidator).
///
/// Level mutation is reserved to the snapshot loader and the delta applier;
/// everything public here is read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolBook {
    /// Contract, e.g. `BTC_USDT`
    symbol: String,

    /// Bid levels, best = highest
    bids: PriceLevelMap,

    /// Ask levels, best = lowest
    asks: PriceLevelMap,

    /// Last update id folded into the book
    last_sequence_id: SequenceId,

    /// Whether a bridge batch has been accepted
    sync_state: SyncState,
}

impl SymbolBook {
    /// Create an empty book awaiting its bridge batch
    #[must_use]
    pub(crate) fn new(symbol: impl Into<String>, last_sequence_id: SequenceId) -> Self {
        Self {
            symbol: symbol.into(),
            bids: PriceLevelMap::new(Side::Bid),
            asks: PriceLevelMap::new(Side::Ask),
            last_sequence_id,
            sync_state: SyncState::AwaitingBridge,
        }
    }

    /// Get the contract
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Get the last update id folded into the book
    #[must_use]
    pub const fn last_sequence_id(&self) -> SequenceId {
        self.last_sequence_id
    }

    /// Get the synchronization state
    #[must_use]
    pub const fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    /// Whether continuity with the stream has been established
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.sync_state == SyncState::Synced
    }

    /// Bid side
    #[must_use]
    pub fn bids(&self) -> &PriceLevelMap {
        &self.bids
    }

    /// Ask side
    #[must_use]
    pub fn asks(&self) -> &PriceLevelMap {
        &self.asks
    }

    /// Either side
    #[must_use]
    pub fn side(&self, side: Side) -> &PriceLevelMap {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    pub(crate) fn side_mut(&mut self, side: Side) -> &mut PriceLevelMap {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    pub(crate) fn advance(&mut self, last_sequence_id: SequenceId) {
        self.last_sequence_id = last_sequence_id;
        self.sync_state = SyncState::Synced;
    }

    /// Get the best bid (highest price)
    ///
    /// Returns `(price, size)` or `None` if no bids.
    #[must_use]
    pub fn best_bid(&self) -> Option<(Price, Size)> {
        self.bids.best()
    }

    /// Get the best ask (lowest price)
    ///
    /// Returns `(price, size)` or `None` if no asks.
    #[must_use]
    pub fn best_ask(&self) -> Option<(Price, Size)> {
        self.asks.best()
    }

    /// Get the mid price
    ///
    /// Returns the average of best bid and best ask, or `None` if either is missing.
    #[must_use]
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }

    /// Get the spread (best ask - best bid)
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some(ask - bid),
            _ => None,
        }
    }

    /// Check if the book is crossed (best bid >= best ask)
    ///
    /// This shouldn't happen in a healthy book but is useful for validation.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => bid >= ask,
            _ => false,
        }
    }

    /// Get the top N bid levels
    #[must_use]
    pub fn top_bids(&self, n: usize) -> Vec<(Price, Size)> {
        self.bids.top(n)
    }

    /// Get the top N ask levels
    #[must_use]
    pub fn top_asks(&self, n: usize) -> Vec<(Price, Size)> {
        self.asks.top(n)
    }

    /// Get total bid size
    #[must_use]
    pub fn total_bid_size(&self) -> Size {
        self.bids.total_size()
    }

    /// Get total ask size
    #[must_use]
    pub fn total_ask_size(&self) -> Size {
        self.asks.total_size()
    }

    /// Check if the book is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Get the number of price levels `(bids, asks)`
    #[must_use]
    pub fn num_levels(&self) -> (usize, usize) {
        (self.bids.len(), self.asks.len())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn sample() -> SymbolBook {
        let mut book = SymbolBook::new("BTC_USDT", 10);
        book.side_mut(Side::Bid).insert(dec!(45), dec!(100));
        book.side_mut(Side::Bid).insert(dec!(44), dec!(200));
        book.side_mut(Side::Bid).insert(dec!(43), dec!(300));
        book.side_mut(Side::Ask).insert(dec!(55), dec!(100));
        book
    }

    #[test]
    fn test_new_book() {
        let book = SymbolBook::new("BTC_USDT", 42);
        assert_eq!(book.symbol(), "BTC_USDT");
        assert!(book.is_empty());
        assert_eq!(book.last_sequence_id(), 42);
        assert_eq!(book.sync_state(), SyncState::AwaitingBridge);
    }

    #[test]
    fn test_mid_price_and_spread() {
        let book = sample();
        assert_eq!(book.mid_price(), Some(dec!(50)));
        assert_eq!(book.spread(), Some(dec!(10)));
        assert!(!book.is_crossed());
    }

    #[test]
    fn test_top_levels() {
        let book = sample();
        let top = book.top_bids(2);
        assert_eq!(top, vec![(dec!(45), dec!(100)), (dec!(44), dec!(200))]);
        assert_eq!(book.total_bid_size(), dec!(600));
        assert_eq!(book.num_levels(), (3, 1));
    }

    #[test]
    fn test_crossed_book() {
        let mut book = sample();
        book.side_mut(Side::Ask).insert(dec!(44.5), dec!(1));
        assert!(book.is_crossed());
    }

    #[test]
    fn test_advance_marks_synced() {
        let mut book = sample();
        book.advance(15);
        assert!(book.is_synced());
        assert_eq!(book.last_sequence_id(), 15);
    }
}

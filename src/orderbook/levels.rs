//! Per-side price level storage.
//!
//! Levels live in a `BTreeMap<Price, Size>`, providing:
//!
//! - O(log n) insertion, deletion, and lookup
//! - O(log n) access to the best level (via `first_key_value` / `last_key_value`)
//! - Ordered iteration for depth-of-book queries

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::types::{Price, Size};

/// Book side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buy side, best = highest price
    Bid,
    /// Sell side, best = lowest price
    Ask,
}

/// Sorted price → size association for one side of a book.
///
/// Every stored size is strictly positive; a zero size means the level is
/// absent. Iteration yields levels best first: descending for bids,
/// ascending for asks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevelMap {
    side: Side,
    levels: BTreeMap<Price, Size>,
}

impl PriceLevelMap {
    /// Create an empty map for the given side
    #[must_use]
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// The side this map holds
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Set the size at `price`, replacing any previous size
    ///
    /// A size that is not strictly positive removes the level instead.
    /// Returns the previous size, if the level existed.
    pub fn insert(&mut self, price: Price, size: Size) -> Option<Size> {
        if size > Decimal::ZERO {
            self.levels.insert(price, size)
        } else {
            self.levels.remove(&price)
        }
    }

    /// Remove the level at `price`, returning its size if it was present
    pub fn remove(&mut self, price: &Price) -> Option<Size> {
        self.levels.remove(price)
    }

    /// Size at `price`
    #[must_use]
    pub fn get(&self, price: &Price) -> Option<Size> {
        self.levels.get(price).copied()
    }

    /// Whether a level exists at `price`
    #[must_use]
    pub fn contains(&self, price: &Price) -> bool {
        self.levels.contains_key(price)
    }

    /// Best level: highest bid or lowest ask
    #[must_use]
    pub fn best(&self) -> Option<(Price, Size)> {
        let best = match self.side {
            Side::Bid => self.levels.last_key_value(),
            Side::Ask => self.levels.first_key_value(),
        };
        best.map(|(&p, &s)| (p, s))
    }

    /// Iterate levels best first
    pub fn iter(&self) -> impl Iterator<Item = (Price, Size)> + '_ {
        let descending = self.side == Side::Bid;
        let mut inner = self.levels.iter();
        std::iter::from_fn(move || {
            let next = if descending {
                inner.next_back()
            } else {
                inner.next()
            };
            next.map(|(&p, &s)| (p, s))
        })
    }

    /// The `n` best levels
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<(Price, Size)> {
        self.iter().take(n).collect()
    }

    /// Sum of all sizes on this side
    #[must_use]
    pub fn total_size(&self) -> Size {
        self.levels.values().copied().sum()
    }

    /// Number of levels
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the side has no levels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Drop every level
    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

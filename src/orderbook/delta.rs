//! Incremental batches and their application to a book.

use rust_decimal::Decimal;

use super::book::SymbolBook;
use super::levels::Side;
use crate::error::ParseError;
use crate::types::{BookUpdateResult, LevelUpdate, Price, SequenceId, Size, TimestampMs};

/// One incremental update covering the id range `[first_seq, last_seq]`.
///
/// Level changes keep the order the venue sent them in. Consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaBatch {
    /// Contract
    pub symbol: String,
    /// First update id (`U`)
    pub first_seq: SequenceId,
    /// Last update id (`u`)
    pub last_seq: SequenceId,
    /// Event time (Unix ms)
    pub timestamp_ms: TimestampMs,
    /// Bid changes; size zero deletes
    pub bids: Vec<(Price, Size)>,
    /// Ask changes; size zero deletes
    pub asks: Vec<(Price, Size)>,
    /// Raw frame the batch was decoded from
    pub raw: Option<String>,
}

impl DeltaBatch {
    /// Create an empty batch
    pub fn new(symbol: impl Into<String>, first_seq: SequenceId, last_seq: SequenceId) -> Self {
        Self {
            symbol: symbol.into(),
            first_seq,
            last_seq,
            timestamp_ms: 0,
            bids: Vec::new(),
            asks: Vec::new(),
            raw: None,
        }
    }

    /// Validate a decoded `futures.order_book_update` result
    ///
    /// Rejects inverted id ranges and negative sizes, so a batch that makes
    /// it this far can be applied without further checks.
    pub fn from_update(update: BookUpdateResult) -> Result<Self, ParseError> {
        if update.first_seq > update.last_seq {
            return Err(ParseError::InvertedRange {
                first: update.first_seq,
                last: update.last_seq,
            });
        }
        Ok(Self {
            symbol: update.symbol,
            first_seq: update.first_seq,
            last_seq: update.last_seq,
            timestamp_ms: update.timestamp_ms,
            bids: levels(update.bids)?,
            asks: levels(update.asks)?,
            raw: None,
        })
    }

    /// Set the bid changes
    #[must_use]
    pub fn with_bids(mut self, bids: Vec<(Price, Size)>) -> Self {
        self.bids = bids;
        self
    }

    /// Set the ask changes
    #[must_use]
    pub fn with_asks(mut self, asks: Vec<(Price, Size)>) -> Self {
        self.asks = asks;
        self
    }

    /// Set the event time
    #[must_use]
    pub fn with_timestamp(mut self, timestamp_ms: TimestampMs) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Attach the raw frame
    #[must_use]
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    /// Changes for one side
    pub fn side(&self, side: Side) -> &[(Price, Size)] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }
}

fn levels(updates: Vec<LevelUpdate>) -> Result<Vec<(Price, Size)>, ParseError> {
    updates
        .into_iter()
        .map(|l| {
            if l.size < Decimal::ZERO {
                Err(ParseError::NegativeSize {
                    price: l.price,
                    size: l.size,
                })
            } else {
                Ok((l.price, l.size))
            }
        })
        .collect()
}

/// The changes a batch actually made to a book.
///
/// Differs from the batch when a deletion names a level that was not
/// present: such entries are skipped here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaRecord {
    /// Bid changes, `(price, 0)` for removals
    pub bids: Vec<(Price, Size)>,
    /// Ask changes, `(price, 0)` for removals
    pub asks: Vec<(Price, Size)>,
}

impl DeltaRecord {
    /// Changes for one side
    pub fn side(&self, side: Side) -> &[(Price, Size)] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Whether nothing changed
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Total number of changed levels
    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<(Price, Size)> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }
}

/// Applies validated batches to book levels.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaApplier;

impl DeltaApplier {
    /// Apply every level change of `batch` to `book`, in venue order
    ///
    /// Size zero removes the level (recorded as `(price, 0)` only if it
    /// existed); a negative size, which [`DeltaBatch::from_update`] never
    /// lets through, is handled the same way. Any other size replaces the
    /// level's size. The sequence cursor is left alone.
    pub fn apply(book: &mut SymbolBook, batch: &DeltaBatch) -> DeltaRecord {
        let mut record = DeltaRecord {
            bids: Vec::with_capacity(batch.bids.len()),
            asks: Vec::with_capacity(batch.asks.len()),
        };

        for side in [Side::Bid, Side::Ask] {
            let levels = book.side_mut(side);
            let changes = record.side_mut(side);
            for &(price, size) in batch.side(side) {
                if size <= Decimal::ZERO {
                    if levels.remove(&price).is_some() {
                        changes.push((price, Decimal::ZERO));
                    }
                } else {
                    levels.insert(price, size);
                    changes.push((price, size));
                }
            }
        }

        record
    }
}

//! Book synchronization across all tracked contracts.
//!
//! This module provides [`SyncCoordinator`], the owner of every
//! [`SymbolBook`]. It routes each incoming [`DeltaBatch`] through the
//! snapshot, validation and application steps and reports the result to a
//! [`BookSink`].
//!
//! # Design
//!
//! Processing is strictly serial: one batch at a time, in arrival order,
//! across all contracts. The only suspension point is the snapshot fetch
//! performed the first time a contract is seen (or after a reset).
//!
//! # Sequence Tracking
//!
//! Each book carries the id of the last change folded into it. When a batch
//! does not continue that id, the coordinator resets according to its
//! [`ResetScope`] and the affected contracts go back through snapshot and
//! bridge.

use rustc_hash::FxHashMap;

use super::book::{SymbolBook, SyncState};
use super::delta::{DeltaApplier, DeltaBatch, DeltaRecord};
use super::snapshot::SnapshotSource;
use super::validator::{SequenceValidator, Verdict};
use crate::config::ResetScope;
use crate::types::{SequenceId, TimestampMs};
use crate::Result;

/// One applied batch, as seen by a [`BookSink`]
#[derive(Debug, Clone, Copy)]
pub struct BookUpdate<'a> {
    /// Book state after the batch
    pub book: &'a SymbolBook,
    /// Changes the batch actually made
    pub delta: &'a DeltaRecord,
    /// Event time of the batch (Unix ms)
    pub timestamp_ms: TimestampMs,
    /// New last update id of the book
    pub sequence_id: SequenceId,
    /// Raw frame the batch came from, when kept
    pub raw: Option<&'a str>,
}

/// Receiver of book events.
///
/// Only [`on_update`](BookSink::on_update) is required.
pub trait BookSink {
    /// A batch was applied
    fn on_update(&mut self, update: BookUpdate<'_>);

    /// A fresh snapshot was installed; its cursor is the snapshot id
    fn on_snapshot(&mut self, _book: &SymbolBook) {}

    /// Books were dropped after a gap
    fn on_reset(&mut self, _symbols: &[String]) {}
}

impl BookSink for () {
    fn on_update(&mut self, _update: BookUpdate<'_>) {}
}

impl<K: BookSink + ?Sized> BookSink for &mut K {
    fn on_update(&mut self, update: BookUpdate<'_>) {
        (**self).on_update(update);
    }

    fn on_snapshot(&mut self, book: &SymbolBook) {
        (**self).on_snapshot(book);
    }

    fn on_reset(&mut self, symbols: &[String]) {
        (**self).on_reset(symbols);
    }
}

/// What happened to one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The batch continued a synced book
    Applied {
        /// New last update id
        sequence_id: SequenceId,
    },
    /// The batch bridged a fresh snapshot; the book is now synced
    Bridged {
        /// New last update id
        sequence_id: SequenceId,
    },
    /// The batch predates the snapshot and was dropped
    Discarded,
    /// The batch broke continuity; these books were dropped
    Reset {
        /// Contracts whose books were cleared
        cleared: Vec<String>,
    },
    /// No book exists for the batch's contract
    Untracked,
}

/// Counters kept by a [`SyncCoordinator`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Batches applied, bridges included
    pub batches_applied: u64,
    /// Stale batches dropped while awaiting a bridge
    pub stale_discarded: u64,
    /// Gaps that triggered a reset
    pub resets: u64,
    /// Snapshots installed
    pub snapshots_loaded: u64,
}

/// Owner of all books and driver of their synchronization.
///
/// # Example
///
/// ```rust,no_run
/// use gateio_book::config::{Config, ResetScope};
/// use gateio_book::orderbook::{DeltaBatch, SnapshotLoader, SyncCoordinator};
///
/// # async fn example() -> gateio_book::Result<()> {
/// let loader = SnapshotLoader::new(&Config::new())?;
/// let mut coordinator = SyncCoordinator::new(loader, ResetScope::Global);
///
/// // In your stream loop:
/// let batch = DeltaBatch::new("BTC_USDT", 2517661101, 2517661113);
/// let outcome = coordinator.process(batch, &mut ()).await?;
/// println!("{outcome:?}");
///
/// if let Some(book) = coordinator.book("BTC_USDT") {
///     println!("Best bid: {:?}", book.best_bid());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SyncCoordinator<S> {
    source: S,
    books: FxHashMap<String, SymbolBook>,
    reset_scope: ResetScope,
    stats: SyncStats,
}

impl<S: SnapshotSource> SyncCoordinator<S> {
    /// Create a coordinator with no books
    pub fn new(source: S, reset_scope: ResetScope) -> Self {
        Self {
            source,
            books: FxHashMap::default(),
            reset_scope,
            stats: SyncStats::default(),
        }
    }

    /// Snapshot source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Reset policy
    pub fn reset_scope(&self) -> ResetScope {
        self.reset_scope
    }

    /// Whether a batch for `symbol` needs a snapshot first
    pub fn needs_snapshot(&self, symbol: &str) -> bool {
        !self.books.contains_key(symbol)
    }

    /// Route one batch, fetching a snapshot first if the contract is unseen
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`](crate::Error::Fetch) if the snapshot could not
    /// be obtained. The contract stays unseen and the next batch retries.
    pub async fn process<K: BookSink + ?Sized>(
        &mut self,
        batch: DeltaBatch,
        sink: &mut K,
    ) -> Result<SyncOutcome> {
        if self.needs_snapshot(&batch.symbol) {
            let book = self.source.fetch_snapshot(&batch.symbol).await?;
            self.install_snapshot(book, sink);
        }
        Ok(self.apply(batch, sink))
    }

    /// Install a freshly fetched book, replacing any existing one
    pub fn install_snapshot<K: BookSink + ?Sized>(&mut self, book: SymbolBook, sink: &mut K) {
        let (bids, asks) = book.num_levels();
        tracing::info!(
            symbol = book.symbol(),
            last_sequence_id = book.last_sequence_id(),
            bids,
            asks,
            "snapshot installed"
        );
        self.stats.snapshots_loaded += 1;
        sink.on_snapshot(&book);
        self.books.insert(book.symbol().to_string(), book);
    }

    /// Validate and apply one batch against an existing book
    ///
    /// Does not fetch: a batch for a contract without a book is
    /// [`SyncOutcome::Untracked`].
    pub fn apply<K: BookSink + ?Sized>(&mut self, batch: DeltaBatch, sink: &mut K) -> SyncOutcome {
        let Some(book) = self.books.get_mut(&batch.symbol) else {
            return SyncOutcome::Untracked;
        };

        let verdict = SequenceValidator::check(book, batch.first_seq, batch.last_seq);
        match verdict {
            Verdict::Discard => {
                tracing::debug!(
                    symbol = %batch.symbol,
                    first_seq = batch.first_seq,
                    last_seq = batch.last_seq,
                    last_sequence_id = book.last_sequence_id(),
                    "stale batch discarded"
                );
                self.stats.stale_discarded += 1;
                SyncOutcome::Discarded
            }
            Verdict::Gap { expected } => {
                tracing::warn!(
                    symbol = %batch.symbol,
                    expected,
                    first_seq = batch.first_seq,
                    last_seq = batch.last_seq,
                    state = ?book.sync_state(),
                    "sequence gap, resetting books"
                );
                let cleared = self.reset(&batch.symbol, sink);
                SyncOutcome::Reset { cleared }
            }
            Verdict::Bridge | Verdict::Apply => {
                let record = DeltaApplier::apply(book, &batch);
                SequenceValidator::commit(book, batch.last_seq);
                self.stats.batches_applied += 1;

                if verdict == Verdict::Bridge {
                    tracing::debug!(
                        symbol = %batch.symbol,
                        first_seq = batch.first_seq,
                        last_seq = batch.last_seq,
                        "bridge established"
                    );
                }

                sink.on_update(BookUpdate {
                    book,
                    delta: &record,
                    timestamp_ms: batch.timestamp_ms,
                    sequence_id: batch.last_seq,
                    raw: batch.raw.as_deref(),
                });

                if verdict == Verdict::Bridge {
                    SyncOutcome::Bridged {
                        sequence_id: batch.last_seq,
                    }
                } else {
                    SyncOutcome::Applied {
                        sequence_id: batch.last_seq,
                    }
                }
            }
        }
    }

    /// Drop books after a gap on `symbol`, per the reset scope
    ///
    /// Returns the contracts that were cleared, sorted.
    pub fn reset<K: BookSink + ?Sized>(&mut self, symbol: &str, sink: &mut K) -> Vec<String> {
        let mut cleared: Vec<String> = match self.reset_scope {
            ResetScope::Global => self.books.drain().map(|(symbol, _)| symbol).collect(),
            ResetScope::PerSymbol => self
                .books
                .remove_entry(symbol)
                .map(|(symbol, _)| symbol)
                .into_iter()
                .collect(),
        };
        cleared.sort_unstable();

        self.stats.resets += 1;
        sink.on_reset(&cleared);
        cleared
    }

    /// Get a book
    pub fn book(&self, symbol: &str) -> Option<&SymbolBook> {
        self.books.get(symbol)
    }

    /// Get the synchronization state of a book
    pub fn state(&self, symbol: &str) -> Option<SyncState> {
        self.books.get(symbol).map(SymbolBook::sync_state)
    }

    /// All contracts with a book, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.books.keys().cloned().collect();
        symbols.sort_unstable();
        symbols
    }

    /// Number of books
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Check if no book is held
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Counters since creation
    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Drop every book without counting a reset
    pub fn clear(&mut self) {
        self.books.clear();
    }
}

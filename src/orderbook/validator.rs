//! Sequence validation for incremental book updates.
//!
//! Gate.io numbers every book change. A batch covers the inclusive id range
//! `[U, u]`. After a snapshot with id `S`:
//!
//! 1. Batches with `u <= S` predate the snapshot and are dropped.
//! 2. The first batch applied must satisfy `U <= S + 1 <= u` (the bridge).
//! 3. Every later batch must start exactly at the previous `u + 1`.
//!
//! Anything else is a gap and forces a resync.

use super::book::{SymbolBook, SyncState};
use crate::types::SequenceId;

/// Decision for one incoming batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Batch predates the snapshot; drop it and keep waiting
    Discard,
    /// First contiguous batch after a snapshot; apply it and mark the book synced
    Bridge,
    /// Next contiguous batch; apply it
    Apply,
    /// Continuity is broken; the book must be rebuilt
    Gap {
        /// Id the book expected next
        expected: SequenceId,
    },
}

impl Verdict {
    /// Whether the batch should be applied to the book
    pub fn applies(&self) -> bool {
        matches!(self, Verdict::Bridge | Verdict::Apply)
    }
}

/// Per-symbol sequence state machine.
///
/// The state itself (`last_sequence_id`, [`SyncState`]) lives on the
/// [`SymbolBook`]; the validator only evaluates and commits transitions.
///
/// | State          | Condition              | Verdict   |
/// |----------------|------------------------|-----------|
/// | AwaitingBridge | `u <= last`            | Discard   |
/// | AwaitingBridge | `U <= last + 1 <= u`   | Bridge    |
/// | AwaitingBridge | otherwise              | Gap       |
/// | Synced         | `U == last + 1`        | Apply     |
/// | Synced         | otherwise              | Gap       |
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceValidator;

impl SequenceValidator {
    /// Evaluate a batch `[first_seq, last_seq]` against a book's cursor
    pub fn evaluate(
        state: SyncState,
        last_sequence_id: SequenceId,
        first_seq: SequenceId,
        last_seq: SequenceId,
    ) -> Verdict {
        let expected = last_sequence_id.saturating_add(1);
        match state {
            SyncState::AwaitingBridge if last_seq <= last_sequence_id => Verdict::Discard,
            SyncState::AwaitingBridge if first_seq <= expected && expected <= last_seq => {
                Verdict::Bridge
            }
            SyncState::Synced if first_seq == expected => Verdict::Apply,
            _ => Verdict::Gap { expected },
        }
    }

    /// Evaluate a batch against `book`
    pub fn check(book: &SymbolBook, first_seq: SequenceId, last_seq: SequenceId) -> Verdict {
        Self::evaluate(
            book.sync_state(),
            book.last_sequence_id(),
            first_seq,
            last_seq,
        )
    }

    /// Commit an applied batch: the book is synced at `last_seq`
    pub(crate) fn commit(book: &mut SymbolBook, last_seq: SequenceId) {
        book.advance(last_seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::orderbook::book::SyncState::{AwaitingBridge, Synced};

    #[test]
    fn test_stale_batch_is_discarded_while_awaiting_bridge() {
        assert_eq!(
            SequenceValidator::evaluate(AwaitingBridge, 100, 90, 99),
            Verdict::Discard
        );
        assert_eq!(
            SequenceValidator::evaluate(AwaitingBridge, 100, 95, 100),
            Verdict::Discard
        );
    }

    #[test]
    fn test_bridge_boundaries() {
        // U < last + 1 <= u
        assert_eq!(
            SequenceValidator::evaluate(AwaitingBridge, 100, 95, 101),
            Verdict::Bridge
        );
        // U == last + 1 == u
        assert_eq!(
            SequenceValidator::evaluate(AwaitingBridge, 100, 101, 101),
            Verdict::Bridge
        );
        // U == last + 1 < u
        assert_eq!(
            SequenceValidator::evaluate(AwaitingBridge, 100, 101, 140),
            Verdict::Bridge
        );
        // U > last + 1
        assert_eq!(
            SequenceValidator::evaluate(AwaitingBridge, 100, 102, 105),
            Verdict::Gap { expected: 101 }
        );
    }

    #[test]
    fn test_synced_requires_exact_continuation() {
        assert_eq!(
            SequenceValidator::evaluate(Synced, 113, 114, 120),
            Verdict::Apply
        );
        assert_eq!(
            SequenceValidator::evaluate(Synced, 113, 115, 120),
            Verdict::Gap { expected: 114 }
        );
        // An overlapping batch is not accepted once synced
        assert_eq!(
            SequenceValidator::evaluate(Synced, 113, 110, 120),
            Verdict::Gap { expected: 114 }
        );
        // Nor is a replayed one
        assert_eq!(
            SequenceValidator::evaluate(Synced, 113, 101, 113),
            Verdict::Gap { expected: 114 }
        );
    }

    #[test]
    fn test_verdict_applies() {
        assert!(Verdict::Bridge.applies());
        assert!(Verdict::Apply.applies());
        assert!(!Verdict::Discard.applies());
        assert!(!Verdict::Gap { expected: 1 }.applies());
    }

    #[test]
    fn test_commit_advances_cursor() {
        let mut book = SymbolBook::new("ETH_USDT", 100);
        assert_eq!(SequenceValidator::check(&book, 95, 101), Verdict::Bridge);
        SequenceValidator::commit(&mut book, 101);
        assert_eq!(book.sync_state(), Synced);
        assert_eq!(SequenceValidator::check(&book, 102, 102), Verdict::Apply);
    }
}

//! Local order book mirror.
//!
//! This module keeps per-contract books in sync with the venue:
//!
//! - [`SnapshotLoader`] fetches a REST depth snapshot and its update id
//! - [`SequenceValidator`] decides whether each batch applies, is stale, or breaks continuity
//! - [`DeltaApplier`] folds an accepted batch into the book's [`PriceLevelMap`]s
//! - [`SyncCoordinator`] ties them together and notifies a [`BookSink`]
//!
//! # Example
//!
//! ```rust
//! use gateio_book::orderbook::{DeltaApplier, DeltaBatch, SnapshotLoader};
//! use gateio_book::types::SnapshotResponse;
//!
//! let response: SnapshotResponse = serde_json::from_str(
//!     r#"{"id": 100, "bids": [{"p": "54664.5", "s": 12000}], "asks": [{"p": "54743.6", "s": 5}]}"#,
//! ).unwrap();
//! let mut book = SnapshotLoader::build_book("BTC_USD", response).unwrap();
//!
//! let batch = DeltaBatch::new("BTC_USD", 101, 101)
//!     .with_bids(vec![("54664.5".parse().unwrap(), "58794".parse().unwrap())]);
//! DeltaApplier::apply(&mut book, &batch);
//!
//! if let Some((price, size)) = book.best_bid() {
//!     println!("Best bid: {} @ {}", size, price);
//! }
//! ```

pub mod book;
pub mod delta;
pub mod levels;
pub mod manager;
pub mod shared;
pub mod snapshot;
pub mod validator;

pub use book::{SymbolBook, SyncState};
pub use delta::{DeltaApplier, DeltaBatch, DeltaRecord};
pub use levels::{PriceLevelMap, Side};
pub use manager::{BookSink, BookUpdate, SyncCoordinator, SyncOutcome, SyncStats};
pub use shared::SharedBooks;
pub use snapshot::{SnapshotLoader, SnapshotSource};
pub use validator::{SequenceValidator, Verdict};

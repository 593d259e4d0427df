//! # gateio-book
//!
//! A local order book mirror for [Gate.io](https://www.gate.io) futures.
//!
//! ## Features
//!
//! - **Snapshot + delta sync** - REST depth snapshot bridged onto the `futures.order_book_update` stream
//! - **Gap detection** - every batch is checked against the book's update id; a gap forces a resync
//! - **Exact prices** - `rust_decimal::Decimal` prices and sizes, no floating point level matching
//! - **Feed routing** - tickers, trades, candles and funding rates decoded alongside the books
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gateio_book::orderbook::SharedBooks;
//! use gateio_book::{Config, FeedHandler};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gateio_book::Error> {
//!     let config = Config::new().with_settle("usdt");
//!     let books = SharedBooks::new();
//!     let mut handler = FeedHandler::from_config(&config, books.clone())?;
//!
//!     // Raw text frames from your WebSocket connection
//!     let (tx, mut rx) = mpsc::channel::<String>(1024);
//!     tokio::spawn(async move {
//!         // tx.send(frame).await ...
//!         drop(tx);
//!     });
//!
//!     handler.run(&mut rx).await?;
//!     println!("BTC_USDT best bid: {:?}", books.best_bid("BTC_USDT"));
//!     Ok(())
//! }
//! ```
//!
//! ## Synchronization
//!
//! The first batch seen for a contract triggers a snapshot fetch. The
//! snapshot's id becomes the book's cursor and the book waits for a batch
//! whose range `[U, u]` covers the next id. From then on every batch must
//! start exactly one past the previous one. Anything else resets the books
//! (all of them by default, see [`config::ResetScope`]).
//!
//! ## Architecture
//!
//! This crate is organized into several modules:
//!
//! - [`orderbook`] - Books, sequence validation and the sync coordinator
//! - [`feed`] - Frame decoding and routing
//! - [`client`] - REST client for depth snapshots
//! - [`types`] - Wire types and stateless payload parsers
//! - [`config`] - Configuration
//! - [`error`] - Error types for the crate

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod orderbook;
pub mod types;

// Re-export main types at crate root for convenience
pub use config::{Config, ResetScope};
pub use error::Error;
pub use feed::{FeedHandler, FeedSink};
pub use orderbook::{BookSink, SymbolBook, SyncCoordinator, SyncOutcome};

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

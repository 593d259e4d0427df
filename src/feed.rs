//! Routing of raw stream frames.
//!
//! [`FeedHandler`] decodes each text frame from the futures stream, hands
//! order book updates to its [`SyncCoordinator`] and delivers the stateless
//! payloads (tickers, trades, candles, funding) to a [`FeedSink`].
//!
//! # Snapshot window
//!
//! [`FeedHandler::run`] keeps reading the inbound channel while a snapshot
//! fetch is in flight. Frames received in that window are queued and
//! processed, in arrival order, once the snapshot is installed and the batch
//! that triggered the fetch has been evaluated against it.
//!
//! # Example
//!
//! ```rust,no_run
//! use gateio_book::orderbook::SharedBooks;
//! use gateio_book::{Config, FeedHandler};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> gateio_book::Result<()> {
//! let books = SharedBooks::new();
//! let mut handler = FeedHandler::from_config(&Config::from_env()?, books.clone())?;
//!
//! let (tx, mut rx) = mpsc::channel::<String>(1024);
//! // feed `tx` from your WebSocket reader task
//! # drop(tx);
//! handler.run(&mut rx).await?;
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::ParseError;
use crate::orderbook::{
    BookSink, DeltaBatch, SnapshotLoader, SnapshotSource, SyncCoordinator, SyncOutcome,
};
use crate::types::{BookUpdateResult, Candle, Channel, Funding, Ticker, Trade, WsEnvelope};
use crate::Result;

/// Receiver of every decoded stream event.
///
/// Extends [`BookSink`] with the stateless channels; all added methods
/// default to doing nothing.
pub trait FeedSink: BookSink {
    /// A `futures.book_ticker` update
    fn on_ticker(&mut self, _ticker: Ticker) {}

    /// One trade from `futures.trades`
    fn on_trade(&mut self, _trade: Trade) {}

    /// One candle from `futures.candlesticks`
    fn on_candle(&mut self, _candle: Candle) {}

    /// One contract's funding state from `futures.tickers`
    fn on_funding(&mut self, _funding: Funding) {}
}

impl FeedSink for () {}

impl<K: FeedSink + ?Sized> FeedSink for &mut K {
    fn on_ticker(&mut self, ticker: Ticker) {
        (**self).on_ticker(ticker);
    }

    fn on_trade(&mut self, trade: Trade) {
        (**self).on_trade(trade);
    }

    fn on_candle(&mut self, candle: Candle) {
        (**self).on_candle(candle);
    }

    fn on_funding(&mut self, funding: Funding) {
        (**self).on_funding(funding);
    }
}

/// Decodes stream frames and drives book synchronization.
#[derive(Debug)]
pub struct FeedHandler<S, K> {
    coordinator: SyncCoordinator<S>,
    sink: K,
    backlog: VecDeque<String>,
}

impl<K: FeedSink> FeedHandler<SnapshotLoader, K> {
    /// Build a handler that fetches snapshots over REST
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn from_config(config: &Config, sink: K) -> Result<Self> {
        let loader = SnapshotLoader::new(config)?;
        Ok(Self::new(
            SyncCoordinator::new(loader, config.reset_scope()),
            sink,
        ))
    }
}

impl<S: SnapshotSource, K: FeedSink> FeedHandler<S, K> {
    /// Create a handler around a coordinator
    pub fn new(coordinator: SyncCoordinator<S>, sink: K) -> Self {
        Self {
            coordinator,
            sink,
            backlog: VecDeque::new(),
        }
    }

    /// The coordinator holding the books
    pub fn coordinator(&self) -> &SyncCoordinator<S> {
        &self.coordinator
    }

    /// The sink events are delivered to
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Mutable access to the sink
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Frames queued during a snapshot fetch and not yet processed
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Take the coordinator and sink back
    pub fn into_parts(self) -> (SyncCoordinator<S>, K) {
        (self.coordinator, self.sink)
    }

    /// Process one frame to completion
    ///
    /// Fetches a snapshot inline if the frame is a book update for an unseen
    /// contract. Returns the outcome for book updates, `None` for anything
    /// else.
    ///
    /// # Errors
    ///
    /// A frame that cannot be decoded is dropped and reported as
    /// [`Error::Parse`](crate::Error::Parse); no book is touched. A failed
    /// snapshot fetch is reported as [`Error::Fetch`](crate::Error::Fetch).
    pub async fn handle_message(&mut self, text: &str) -> Result<Option<SyncOutcome>> {
        let batch = match self.decode(text) {
            Ok(Some(batch)) => batch,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
                return Err(e.into());
            }
        };
        let outcome = self.coordinator.process(batch, &mut self.sink).await?;
        Ok(Some(outcome))
    }

    /// Consume frames from `inbound` until it closes
    ///
    /// Malformed frames are logged and skipped. Returns once the channel is
    /// closed and every queued frame has been processed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`](crate::Error::Fetch) when a snapshot cannot be
    /// obtained. The batch that needed it is lost, frames queued during the
    /// fetch are kept and processed by the next call.
    pub async fn run(&mut self, inbound: &mut mpsc::Receiver<String>) -> Result<()> {
        let mut open = true;
        loop {
            let text = match self.backlog.pop_front() {
                Some(text) => text,
                None if open => match inbound.recv().await {
                    Some(text) => text,
                    None => {
                        open = false;
                        continue;
                    }
                },
                None => return Ok(()),
            };

            let batch = match self.decode(&text) {
                Ok(Some(batch)) => batch,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed frame");
                    continue;
                }
            };

            if self.coordinator.needs_snapshot(&batch.symbol) {
                let book = {
                    let fetch = self.coordinator.source().fetch_snapshot(&batch.symbol);
                    tokio::pin!(fetch);
                    loop {
                        tokio::select! {
                            biased;
                            result = &mut fetch => break result?,
                            frame = inbound.recv(), if open => match frame {
                                Some(frame) => self.backlog.push_back(frame),
                                None => open = false,
                            },
                        }
                    }
                };
                if !self.backlog.is_empty() {
                    tracing::debug!(
                        symbol = %batch.symbol,
                        queued = self.backlog.len(),
                        "frames queued during snapshot fetch"
                    );
                }
                self.coordinator.install_snapshot(book, &mut self.sink);
            }

            self.coordinator.apply(batch, &mut self.sink);
        }
    }

    /// Decode a frame; book updates are returned, everything else is delivered
    ///
    /// Every value of a frame is parsed before any is delivered, so a bad
    /// entry drops the whole frame.
    fn decode(&mut self, text: &str) -> std::result::Result<Option<DeltaBatch>, ParseError> {
        let envelope = WsEnvelope::parse(text)?;

        if let Some(error) = envelope.exchange_error() {
            tracing::warn!(channel = ?envelope.channel, %error, "exchange reported an error");
            return Ok(None);
        }
        if envelope.is_ack() {
            return Ok(None);
        }
        let Some(channel) = envelope.channel() else {
            tracing::warn!(event = ?envelope.event, "frame without channel ignored");
            return Ok(None);
        };

        match channel {
            Channel::OrderBookUpdate => {
                let update: BookUpdateResult = envelope.decode_result()?;
                let batch = DeltaBatch::from_update(update)?.with_raw(text);
                return Ok(Some(batch));
            }
            Channel::BookTicker => {
                let ticker = Ticker::from_envelope(&envelope)?;
                self.sink.on_ticker(ticker);
            }
            Channel::Trades => {
                for trade in Trade::from_envelope(&envelope)? {
                    self.sink.on_trade(trade);
                }
            }
            Channel::Candlesticks => {
                for candle in Candle::from_envelope(&envelope)? {
                    self.sink.on_candle(candle);
                }
            }
            Channel::Tickers => {
                for funding in Funding::from_envelope(&envelope)? {
                    self.sink.on_funding(funding);
                }
            }
            Channel::Other(name) => {
                tracing::warn!(channel = %name, "unhandled channel");
            }
        }
        Ok(None)
    }
}

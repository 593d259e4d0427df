//! Replay stream frames through the feed handler - prints book updates
//!
//! Reads one JSON frame per line, from a file or stdin, and mirrors the books
//! using live REST snapshots. Pipe a live capture in to follow the market:
//!
//! Usage:
//!   websocat wss://fx-ws.gateio.ws/v4/ws/usdt < subscribe.json | cargo run --example replay
//!   cargo run --example replay -- frames.ndjson
//!
//! Optional:
//!   GATEIO_ENV=testnet     # Use testnet snapshots (default: live)
//!   GATEIO_SETTLE=btc      # Settlement currency (default: usdt)
//!   GATEIO_DEPTH=50        # Snapshot depth (default: 100)
//!   RUST_LOG=gateio_book=debug

use gateio_book::orderbook::{BookSink, BookUpdate, SharedBooks, SymbolBook};
use gateio_book::types::{Ticker, Trade};
use gateio_book::{Config, FeedHandler, FeedSink};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Prints every event and keeps the shared view current
struct Printer {
    books: SharedBooks,
    updates: u64,
}

impl BookSink for Printer {
    fn on_update(&mut self, update: BookUpdate<'_>) {
        self.updates += 1;
        let book = update.book;
        println!(
            "{:<12} #{:<12} bid {:?} ask {:?} spread {:?} ({} changes)",
            book.symbol(),
            update.sequence_id,
            book.best_bid(),
            book.best_ask(),
            book.spread(),
            update.delta.len()
        );
        self.books.on_update(update);
    }

    fn on_snapshot(&mut self, book: &SymbolBook) {
        let (bids, asks) = book.num_levels();
        println!(
            "{:<12} snapshot #{} ({} bids, {} asks)",
            book.symbol(),
            book.last_sequence_id(),
            bids,
            asks
        );
        self.books.on_snapshot(book);
    }

    fn on_reset(&mut self, symbols: &[String]) {
        println!("!!! reset: {}", symbols.join(", "));
        self.books.on_reset(symbols);
    }
}

impl FeedSink for Printer {
    fn on_ticker(&mut self, ticker: Ticker) {
        println!(
            "{:<12} ticker {} x {} / {} x {}",
            ticker.symbol, ticker.bid_size, ticker.bid, ticker.ask, ticker.ask_size
        );
    }

    fn on_trade(&mut self, trade: Trade) {
        println!(
            "{:<12} trade {:?} {} @ {}",
            trade.symbol, trade.side, trade.amount, trade.price
        );
    }
}

async fn forward<R>(reader: R, tx: mpsc::Sender<String>) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if tx.send(line).await.is_err() {
            break;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gateio_book=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    println!("=== Gate.io Book Replay ===");
    println!("Snapshots: {}", config.rest_base_url());
    println!("Frames:    {} (subscribe and pipe in)\n", config.websocket_url());

    let books = SharedBooks::new();
    let printer = Printer {
        books: books.clone(),
        updates: 0,
    };
    let mut handler = FeedHandler::from_config(&config, printer)?;

    let (tx, mut rx) = mpsc::channel::<String>(4096);
    let reader = match std::env::args().nth(1) {
        Some(path) => {
            let file = tokio::fs::File::open(&path).await?;
            tokio::spawn(forward(BufReader::new(file), tx))
        }
        None => tokio::spawn(forward(BufReader::new(tokio::io::stdin()), tx)),
    };

    // A failed snapshot loses one batch; keep going with the rest
    while let Err(e) = handler.run(&mut rx).await {
        eprintln!("snapshot fetch failed: {e}");
    }
    reader.await??;

    let stats = handler.coordinator().stats();
    println!("\n=== Summary ===");
    println!("Updates printed:   {}", handler.sink().updates);
    println!("Batches applied:   {}", stats.batches_applied);
    println!("Stale discarded:   {}", stats.stale_discarded);
    println!("Resets:            {}", stats.resets);
    println!("Snapshots loaded:  {}", stats.snapshots_loaded);
    for symbol in books.symbols() {
        println!(
            "{:<12} mid {:?} @ #{}",
            symbol,
            books.mid_price(&symbol),
            books.sequence_id(&symbol).unwrap_or_default()
        );
    }

    Ok(())
}

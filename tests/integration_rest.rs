//! Integration tests for the REST API.
//!
//! These tests run against Gate.io's public futures API. No credentials are
//! needed, but they hit the network and are skipped by default.
//!
//! # Setup
//!
//! Set environment variables:
//!    - GATEIO_LIVE_TESTS: any value enables the tests
//!    - GATEIO_ENV: `live` (default) or `testnet`
//!    - GATEIO_SETTLE: settlement currency (default `usdt`)
//!
//! # Running
//!
//! ```bash
//! GATEIO_LIVE_TESTS=1 cargo test --test integration_rest
//! ```

use gateio_book::client::RestClient;
use gateio_book::error::FetchError;
use gateio_book::orderbook::{SnapshotLoader, SnapshotSource, SyncState};
use gateio_book::Config;

/// Helper to create a config from environment variables
fn create_config() -> Option<Config> {
    std::env::var("GATEIO_LIVE_TESTS").ok()?;
    Config::from_env().ok().map(|c| c.with_depth_limit(20))
}

/// Skip test if live tests are not enabled
macro_rules! require_config {
    () => {
        match create_config() {
            Some(c) => c,
            None => {
                eprintln!("Skipping test: GATEIO_LIVE_TESTS not set");
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_get_order_book_snapshot() {
    let config = require_config!();
    let rest = RestClient::new(&config).unwrap();

    let snapshot = rest
        .order_book(config.settle(), "BTC_USDT", config.depth_limit())
        .await;
    assert!(snapshot.is_ok(), "Failed to get snapshot: {:?}", snapshot);

    let snapshot = snapshot.unwrap();
    println!(
        "Snapshot id {}: {} bids, {} asks",
        snapshot.id,
        snapshot.bids.len(),
        snapshot.asks.len()
    );
    assert!(snapshot.id > 0);
    assert!(snapshot.bids.len() <= 20);
}

#[tokio::test]
async fn test_loader_builds_uncrossed_book() {
    let config = require_config!();
    let loader = SnapshotLoader::new(&config).unwrap();

    let book = loader.fetch_snapshot("BTC_USDT").await;
    assert!(book.is_ok(), "Failed to load snapshot: {:?}", book);

    let book = book.unwrap();
    println!(
        "BTC_USDT @ {}: bid {:?} ask {:?}",
        book.last_sequence_id(),
        book.best_bid(),
        book.best_ask()
    );
    assert_eq!(book.sync_state(), SyncState::AwaitingBridge);
    assert!(!book.is_crossed());
    assert!(book.bids().iter().all(|(_, size)| size > rust_decimal::Decimal::ZERO));
}

#[tokio::test]
async fn test_unknown_contract_is_client_error() {
    let config = require_config!();
    let rest = RestClient::new(&config).unwrap();

    let result = rest
        .order_book(config.settle(), "NOT_A_CONTRACT_XYZ", 10)
        .await;
    match result {
        Err(err @ FetchError::Status { .. }) => {
            println!("Got expected error: {err}");
            assert!(err.is_client_error());
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}

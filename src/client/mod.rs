//! API clients for communicating with Gate.io.
//!
//! This module contains:
//!
//! - [`rest`] - HTTP client for the public REST endpoints

pub mod rest;

pub use rest::RestClient;

//! Blockchain data service integration.
//!
//! This module provides the query types and the asynchronous `DataService` interface the bridge
//! uses to answer the engine's data-fetch callbacks and to refresh network fees and currencies,
//! together with `BlocksetClient`, an HTTP implementation of that interface.

/// HTTP client for the data service
mod client;
/// Asynchronous query interface
mod service;
/// Type definitions for data service payloads
mod types;

pub use client::BlocksetClient;
pub use service::{DataService, TransactionQuery};
pub use types::*;

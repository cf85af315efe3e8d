//! Sessions and the dispatch of engine callbacks to them.
//!
//! A [`Bridge`] creates [`System`] sessions, each bound to one engine system. Engine callbacks
//! arrive at the [`EventDispatcher`], which resolves the session by token and its entities by
//! handle before delivering events to the session's listener or answering data-fetch requests
//! from the session's data service.

/// Account initialization for networks that need an on-chain account
mod account;
/// Session creation and teardown
pub mod bridge;
/// Fee estimation callbacks keyed by operation cookie
pub mod coordinator;
/// Currency bundles from data service currencies
pub mod currency;
/// Engine callback dispatch
pub mod dispatcher;
/// Wrappers over owned engine handles
pub mod entities;
/// Normalized events and the application listener
pub mod events;
/// Serial job queues
pub mod pump;
/// Answers to engine data-fetch requests
pub mod query_adapter;
/// Merging of fee transfers into transfer bundles
pub mod reconciler;
/// Token to session registry
pub mod registry;
/// Handle membership checks
pub mod resolver;
/// The session object
pub mod session;
/// Per-account storage directories
pub mod storage;
/// Error types
pub mod types;

pub use bridge::Bridge;
pub use coordinator::FeeEstimate;
pub use dispatcher::EventDispatcher;
pub use entities::{Network, Transfer, Wallet, WalletManager};
pub use events::*;
pub use pump::Pump;
pub use registry::SessionRegistry;
pub use session::System;
pub use types::*;

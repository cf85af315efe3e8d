//! Bridge between a native wallet synchronization engine and the application.
//!
//! The engine keeps wallets in sync and calls back for two things: lifecycle events, which are
//! normalized and delivered to the application's [`SystemListener`](system::SystemListener),
//! and blockchain data, which is fetched from a [`DataService`](client::DataService) and
//! announced back to the engine.

pub mod client;
pub mod config;
pub mod engine;
pub mod system;

#[cfg(test)]
mod testing;

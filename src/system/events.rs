//! Normalized events announced to the application.
//!
//! Each family mirrors one engine event family, with handles already resolved to managed
//! wrappers. Events are delivered on the session's delivery pump to a [`SystemListener`].

use chrono::{DateTime, Utc};

use crate::engine::{
	Amount, FeeBasis, SyncDepth, SyncStoppedReason, SystemState, TransferState, WalletManagerState,
	WalletState,
};
use crate::system::entities::{Network, Transfer, Wallet, WalletManager};
use crate::system::session::System;

#[derive(Debug, Clone)]
pub enum SystemEvent {
	Created,
	Changed { old: SystemState, new: SystemState },
	Deleted,
	NetworkAdded(Network),
	ManagerAdded(WalletManager),
	DiscoveredNetworks(Vec<Network>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
	Created,
	FeesUpdated,
	CurrenciesUpdated,
	Deleted,
}

#[derive(Debug, Clone)]
pub enum WalletManagerEvent {
	Created,
	Changed {
		old: WalletManagerState,
		new: WalletManagerState,
	},
	Deleted,
	WalletAdded(Wallet),
	WalletChanged(Wallet),
	WalletDeleted(Wallet),
	SyncStarted,
	SyncProgress {
		percent_complete: f32,
		/// Time of the last block synced, if the engine knows it.
		timestamp: Option<DateTime<Utc>>,
	},
	SyncStopped(SyncStoppedReason),
	SyncRecommended(SyncDepth),
	BlockUpdated(u64),
}

#[derive(Debug, Clone)]
pub enum WalletEvent {
	Created,
	Changed { old: WalletState, new: WalletState },
	Deleted,
	TransferAdded(Transfer),
	TransferChanged(Transfer),
	TransferSubmitted(Transfer),
	TransferDeleted(Transfer),
	BalanceUpdated(Amount),
	FeeBasisUpdated(FeeBasis),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
	Created,
	Changed { old: TransferState, new: TransferState },
	Deleted,
}

/// Application listener for session events.
///
/// Every method runs on the session's delivery pump, one event at a time.
pub trait SystemListener: Send + Sync {
	fn handle_system_event(&self, _system: &System, _event: SystemEvent) {}

	fn handle_network_event(&self, _system: &System, _network: Network, _event: NetworkEvent) {}

	fn handle_manager_event(&self, _system: &System, _manager: WalletManager, _event: WalletManagerEvent) {}

	fn handle_wallet_event(
		&self,
		_system: &System,
		_manager: WalletManager,
		_wallet: Wallet,
		_event: WalletEvent,
	) {
	}

	fn handle_transfer_event(
		&self,
		_system: &System,
		_manager: WalletManager,
		_wallet: Wallet,
		_transfer: Transfer,
		_event: TransferEvent,
	) {
	}
}

/// Convert an engine sync timestamp in seconds, where zero means unknown.
pub(crate) fn sync_timestamp(seconds: u64) -> Option<DateTime<Utc>> {
	if seconds == 0 {
		return None;
	}
	i64::try_from(seconds)
		.ok()
		.and_then(|secs| DateTime::from_timestamp(secs, 0))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sync_timestamp_zero_is_unknown() {
		assert_eq!(sync_timestamp(0), None);
		assert_eq!(
			sync_timestamp(1_609_459_200).map(|t| t.to_rfc3339()),
			Some("2021-01-01T00:00:00+00:00".to_string())
		);
	}
}

//! Recovery of managed wrappers from engine handles.
//!
//! Events can arrive after the entity they name was concurrently removed from its parent, so a
//! handle is only wrapped once the engine confirms it is still a member of that parent. A miss
//! is returned as `None`; callers log it and drop the event.

use crate::engine::{ManagerKind, NetworkKind, Owned, SystemKind, TransferKind, WalletKind};
use crate::system::entities::{Network, Transfer, Wallet, WalletManager};

pub struct HandleResolver<'a> {
	system: &'a Owned<SystemKind>,
}

impl<'a> HandleResolver<'a> {
	pub fn new(system: &'a Owned<SystemKind>) -> Self {
		Self { system }
	}

	/// Wrap `network` if the system still lists it.
	pub fn network(&self, network: &Owned<NetworkKind>) -> Option<Network> {
		self.system
			.engine()
			.has_network(self.system.id(), network.id())
			.then(|| Network::new(network.retain()))
	}

	/// Wrap `manager` if the system still lists it.
	pub fn manager(&self, manager: &Owned<ManagerKind>) -> Option<WalletManager> {
		self.system
			.engine()
			.has_manager(self.system.id(), manager.id())
			.then(|| WalletManager::new(manager.retain()))
	}

	/// Wrap `wallet` if `manager` still lists it.
	pub fn wallet(&self, manager: &WalletManager, wallet: &Owned<WalletKind>) -> Option<Wallet> {
		self.system
			.engine()
			.has_wallet(manager.id(), wallet.id())
			.then(|| Wallet::new(wallet.retain()))
	}

	/// Wrap `transfer` if `wallet` still lists it.
	pub fn transfer(&self, wallet: &Wallet, transfer: &Owned<TransferKind>) -> Option<Transfer> {
		self.system
			.engine()
			.has_transfer(wallet.id(), transfer.id())
			.then(|| Transfer::new(transfer.retain()))
	}
}

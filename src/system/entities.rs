//! Managed wrappers around engine entities.
//!
//! A wrapper holds one retained grant on its entity, shared between clones and released when
//! the last clone is dropped. Wrappers compare equal when they refer to the same entity.

use std::fmt;
use std::sync::Arc;

use crate::engine::{
	Amount, HandleId, ManagerKind, NetworkFee, NetworkKind, NetworkType, OperationCookie, Owned,
	SyncEngine, TransferKind, WalletKind,
};

macro_rules! managed {
	($name:ident, $kind:ty) => {
		#[derive(Clone)]
		pub struct $name {
			handle: Arc<Owned<$kind>>,
		}

		impl $name {
			pub(crate) fn new(handle: Owned<$kind>) -> Self {
				Self {
					handle: Arc::new(handle),
				}
			}

			pub fn id(&self) -> HandleId {
				self.handle.id()
			}

			fn engine(&self) -> &Arc<dyn SyncEngine> {
				self.handle.engine()
			}
		}

		impl PartialEq for $name {
			fn eq(&self, other: &Self) -> bool {
				self.id() == other.id()
			}
		}

		impl Eq for $name {}

		impl fmt::Debug for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}({})", stringify!($name), self.id())
			}
		}
	};
}

managed!(Network, NetworkKind);
managed!(WalletManager, ManagerKind);
managed!(Wallet, WalletKind);
managed!(Transfer, TransferKind);

impl Network {
	/// Blockchain identifier used by the data service, e.g. `ethereum-mainnet`.
	pub fn uids(&self) -> String {
		self.engine().network_uids(self.id())
	}

	pub fn network_type(&self) -> NetworkType {
		self.engine().network_type(self.id())
	}

	pub(crate) fn set_height(&self, height: u64) {
		self.engine().network_set_height(self.id(), height);
	}

	pub(crate) fn set_verified_block_hash(&self, hash: &str) {
		self.engine().network_set_verified_block_hash(self.id(), hash);
	}

	pub(crate) fn set_fees(&self, fees: Vec<NetworkFee>) {
		self.engine().network_set_fees(self.id(), fees);
	}
}

impl WalletManager {
	/// The network this manager synchronizes.
	pub fn network(&self) -> Network {
		let id = self.engine().manager_network(self.id());
		Network::new(Owned::adopt(self.engine().clone(), id))
	}

	pub fn wallets(&self) -> Vec<Wallet> {
		let engine = self.engine().clone();
		engine
			.wallets(self.id())
			.into_iter()
			.map(|id| Wallet::new(Owned::adopt(engine.clone(), id)))
			.collect()
	}

	pub fn connect(&self) {
		self.engine().manager_connect(self.id());
	}

	pub fn disconnect(&self) {
		self.engine().manager_disconnect(self.id());
	}

	pub fn stop(&self) {
		self.engine().manager_stop(self.id());
	}
}

impl Wallet {
	/// Ask the engine for a fee basis; the outcome arrives as a wallet event carrying `cookie`.
	pub(crate) fn estimate_fee_basis(&self, cookie: OperationCookie, target: &str, amount: &Amount, fee: &NetworkFee) {
		self.engine()
			.wallet_estimate_fee_basis(self.id(), cookie, target, amount, fee);
	}
}

impl Transfer {
	/// Data service identifier of the transfer, once known.
	pub fn uids(&self) -> Option<String> {
		self.engine().transfer_uids(self.id())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockEngine;

	#[test]
	fn test_clones_share_one_grant() {
		let engine = MockEngine::new();
		let wallet = Wallet::new(engine.grant::<WalletKind>(HandleId(3)));
		let copy = wallet.clone();
		assert_eq!(wallet, copy);
		assert_eq!(engine.outstanding(HandleId(3)), 1);

		drop(wallet);
		assert_eq!(engine.outstanding(HandleId(3)), 1);
		drop(copy);
		assert_eq!(engine.outstanding(HandleId(3)), 0);
	}

	#[test]
	fn test_manager_network_adopts_grant() {
		let engine = MockEngine::new();
		engine.add_network(HandleId(10), "ethereum-mainnet", NetworkType::Eth);
		engine.add_manager(HandleId(20), HandleId(10));

		let manager = WalletManager::new(engine.grant::<ManagerKind>(HandleId(20)));
		let network = manager.network();
		assert_eq!(network.id(), HandleId(10));
		assert_eq!(network.uids(), "ethereum-mainnet");
		assert_eq!(network.network_type(), NetworkType::Eth);

		drop(network);
		assert_eq!(engine.outstanding(HandleId(10)), 0);
	}
}

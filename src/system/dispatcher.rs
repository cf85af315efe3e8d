//! Dispatch of engine callbacks onto the bridge's pumps.
//!
//! The engine calls [`EventDispatcher`] from its own threads. Lifecycle events are queued on the
//! lifecycle pump and data-fetch requests on the data pump; each pump runs its jobs one at a
//! time in arrival order. A job resolves the session by token and the entities by handle, then
//! hands a normalized event to the session's delivery pump or starts a data service query.
//!
//! Every handle the engine passes in is moved into the job, so it is released exactly once when
//! the job finishes, whether it announced, missed, or panicked. A job that is never run (the
//! pump has stopped) releases its handles when it is dropped.

use std::sync::Arc;

use tracing::{debug, error};

use crate::engine::{
	CallbackState, EngineClient, EngineListener, EngineManagerEvent, EngineNetworkEvent,
	EngineSystemEvent, EngineTransferEvent, EngineWalletEvent, ManagerKind, NetworkKind, Owned,
	SessionToken, SystemKind, TransferKind, WalletKind,
};
use crate::system::entities::{Network, Transfer, Wallet, WalletManager};
use crate::system::events::{
	NetworkEvent, SystemEvent, TransferEvent, WalletEvent, WalletManagerEvent, sync_timestamp,
};
use crate::system::pump::Pump;
use crate::system::query_adapter::{
	self, BlockNumber, Completion, FeeEstimated, Outcome, Submitted, Transactions, Transfers,
};
use crate::system::registry::SessionRegistry;
use crate::system::session::System;

pub struct EventDispatcher {
	registry: Arc<SessionRegistry<System>>,
	lifecycle: Pump,
	data: Pump,
}

impl EventDispatcher {
	/// Create a dispatcher with its lifecycle and data pumps on the current tokio runtime.
	pub fn new(registry: Arc<SessionRegistry<System>>) -> Self {
		Self {
			registry,
			lifecycle: Pump::spawn("lifecycle"),
			data: Pump::spawn("data"),
		}
	}

	pub fn registry(&self) -> &Arc<SessionRegistry<System>> {
		&self.registry
	}

	/// Wait until every callback received so far has been dispatched.
	pub async fn flush(&self) {
		self.lifecycle.flush().await;
		self.data.flush().await;
	}

	fn on_lifecycle<F>(&self, handler: &'static str, token: SessionToken, job: F)
	where
		F: FnOnce(Arc<System>) + Send + 'static,
	{
		let registry = self.registry.clone();
		self.lifecycle.submit(move || match registry.lookup(token) {
			Some(system) => job(system),
			None => error!("{}: missed system", handler),
		});
	}

	fn on_query<T, F>(&self, token: SessionToken, completion: Completion<T>, run: F)
	where
		T: Outcome,
		F: FnOnce(&System, WalletManager, Completion<T>) + Send + 'static,
	{
		let registry = self.registry.clone();
		self.data.submit(move || {
			let Some(system) = registry.lookup(token) else {
				error!("{}: missed system", T::REQUEST);
				return;
			};
			let Some(manager) = system.resolver().manager(completion.manager()) else {
				error!("{}: missed manager", T::REQUEST);
				return;
			};
			run(system.as_ref(), manager, completion);
		});
	}
}

fn dispatch_system_event(system: &Arc<System>, event: EngineSystemEvent) {
	let event = match event {
		EngineSystemEvent::Created => SystemEvent::Created,
		EngineSystemEvent::Changed { old, new } => {
			debug!("SystemChanged ({:?} -> {:?})", old, new);
			SystemEvent::Changed { old, new }
		}
		EngineSystemEvent::Deleted => SystemEvent::Deleted,
		EngineSystemEvent::NetworkAdded(network) => match system.resolver().network(&network) {
			Some(network) => SystemEvent::NetworkAdded(network),
			None => {
				error!("SystemNetworkAdded: missed network");
				return;
			}
		},
		EngineSystemEvent::ManagerAdded(manager) => match system.resolver().manager(&manager) {
			Some(manager) => SystemEvent::ManagerAdded(manager),
			None => {
				error!("SystemManagerAdded: missed manager");
				return;
			}
		},
		EngineSystemEvent::DiscoveredNetworks => SystemEvent::DiscoveredNetworks(system.networks()),
	};
	system.announce_system_event(event);
}

fn dispatch_network_event(system: &Arc<System>, network: Owned<NetworkKind>, event: EngineNetworkEvent) {
	let network = match event {
		EngineNetworkEvent::Created => Network::new(network),
		_ => match system.resolver().network(&network) {
			Some(network) => network,
			None => {
				error!("NetworkEvent: missed network");
				return;
			}
		},
	};

	let event = match event {
		EngineNetworkEvent::Created => NetworkEvent::Created,
		EngineNetworkEvent::FeesUpdated => NetworkEvent::FeesUpdated,
		EngineNetworkEvent::CurrenciesUpdated => NetworkEvent::CurrenciesUpdated,
		EngineNetworkEvent::Deleted => NetworkEvent::Deleted,
	};
	system.announce_network_event(network, event);
}

fn dispatch_manager_event(system: &Arc<System>, manager: Owned<ManagerKind>, event: EngineManagerEvent) {
	if let EngineManagerEvent::Created = event {
		system.announce_manager_event(WalletManager::new(manager), WalletManagerEvent::Created);
		return;
	}

	let resolver = system.resolver();
	let Some(manager) = resolver.manager(&manager) else {
		error!("WalletManagerEvent: missed manager");
		return;
	};

	let event = match event {
		EngineManagerEvent::Created => WalletManagerEvent::Created,
		EngineManagerEvent::Changed { old, new } => {
			debug!("WalletManagerChanged ({:?} -> {:?})", old, new);
			WalletManagerEvent::Changed { old, new }
		}
		EngineManagerEvent::Deleted => WalletManagerEvent::Deleted,
		EngineManagerEvent::WalletAdded(wallet) => match resolver.wallet(&manager, &wallet) {
			Some(wallet) => WalletManagerEvent::WalletAdded(wallet),
			None => {
				error!("WalletManagerWalletAdded: missed wallet");
				return;
			}
		},
		EngineManagerEvent::WalletChanged(wallet) => match resolver.wallet(&manager, &wallet) {
			Some(wallet) => WalletManagerEvent::WalletChanged(wallet),
			None => {
				error!("WalletManagerWalletChanged: missed wallet");
				return;
			}
		},
		EngineManagerEvent::WalletDeleted(wallet) => match resolver.wallet(&manager, &wallet) {
			Some(wallet) => WalletManagerEvent::WalletDeleted(wallet),
			None => {
				error!("WalletManagerWalletDeleted: missed wallet");
				return;
			}
		},
		EngineManagerEvent::SyncStarted => WalletManagerEvent::SyncStarted,
		EngineManagerEvent::SyncContinues {
			percent_complete,
			timestamp,
		} => {
			debug!("WalletManagerSyncProgress ({})", percent_complete);
			WalletManagerEvent::SyncProgress {
				percent_complete,
				timestamp: sync_timestamp(timestamp),
			}
		}
		EngineManagerEvent::SyncStopped(reason) => {
			debug!("WalletManagerSyncStopped: {:?}", reason);
			WalletManagerEvent::SyncStopped(reason)
		}
		EngineManagerEvent::SyncRecommended(depth) => {
			debug!("WalletManagerSyncRecommended: {:?}", depth);
			WalletManagerEvent::SyncRecommended(depth)
		}
		EngineManagerEvent::BlockHeightUpdated(height) => {
			debug!("WalletManagerBlockHeightUpdated ({})", height);
			WalletManagerEvent::BlockUpdated(height)
		}
	};
	system.announce_manager_event(manager, event);
}

fn dispatch_wallet_event(
	system: &Arc<System>,
	manager: Owned<ManagerKind>,
	wallet: Owned<WalletKind>,
	event: EngineWalletEvent,
) {
	if let EngineWalletEvent::FeeBasisEstimated { status, cookie, basis } = event {
		debug!("WalletFeeBasisEstimated ({:?})", status);
		system.coordinator().handle_fee_estimated(status, cookie, basis);
		return;
	}

	let resolver = system.resolver();
	let Some(manager) = resolver.manager(&manager) else {
		error!("WalletEvent: missed manager");
		return;
	};

	let wallet = match event {
		EngineWalletEvent::Created => Wallet::new(wallet),
		_ => match resolver.wallet(&manager, &wallet) {
			Some(wallet) => wallet,
			None => {
				error!("WalletEvent: missed wallet");
				return;
			}
		},
	};

	let event = match event {
		EngineWalletEvent::Created => WalletEvent::Created,
		EngineWalletEvent::Changed { old, new } => {
			debug!("WalletChanged ({:?} -> {:?})", old, new);
			WalletEvent::Changed { old, new }
		}
		EngineWalletEvent::Deleted => WalletEvent::Deleted,
		EngineWalletEvent::TransferAdded(transfer) => match resolver.transfer(&wallet, &transfer) {
			Some(transfer) => WalletEvent::TransferAdded(transfer),
			None => {
				error!("WalletTransferAdded: missed transfer");
				return;
			}
		},
		EngineWalletEvent::TransferChanged(transfer) => match resolver.transfer(&wallet, &transfer) {
			Some(transfer) => WalletEvent::TransferChanged(transfer),
			None => {
				error!("WalletTransferChanged: missed transfer");
				return;
			}
		},
		EngineWalletEvent::TransferSubmitted(transfer) => match resolver.transfer(&wallet, &transfer) {
			Some(transfer) => WalletEvent::TransferSubmitted(transfer),
			None => {
				error!("WalletTransferSubmitted: missed transfer");
				return;
			}
		},
		EngineWalletEvent::TransferDeleted(transfer) => match resolver.transfer(&wallet, &transfer) {
			Some(transfer) => WalletEvent::TransferDeleted(transfer),
			None => {
				error!("WalletTransferDeleted: missed transfer");
				return;
			}
		},
		EngineWalletEvent::BalanceUpdated(amount) => {
			debug!("WalletBalanceUpdated ({})", amount);
			WalletEvent::BalanceUpdated(amount)
		}
		EngineWalletEvent::FeeBasisUpdated(basis) => {
			debug!("WalletFeeBasisUpdated ({})", basis.fee);
			WalletEvent::FeeBasisUpdated(basis)
		}
		EngineWalletEvent::FeeBasisEstimated { .. } => return,
	};
	system.announce_wallet_event(manager, wallet, event);
}

fn dispatch_transfer_event(
	system: &Arc<System>,
	manager: Owned<ManagerKind>,
	wallet: Owned<WalletKind>,
	transfer: Owned<TransferKind>,
	event: EngineTransferEvent,
) {
	let resolver = system.resolver();
	let Some(manager) = resolver.manager(&manager) else {
		error!("TransferEvent: missed manager");
		return;
	};
	let Some(wallet) = resolver.wallet(&manager, &wallet) else {
		error!("TransferEvent: missed wallet");
		return;
	};

	let transfer = match event {
		EngineTransferEvent::Created => Transfer::new(transfer),
		_ => match resolver.transfer(&wallet, &transfer) {
			Some(transfer) => transfer,
			None => {
				error!("TransferEvent: missed transfer");
				return;
			}
		},
	};

	let event = match event {
		EngineTransferEvent::Created => TransferEvent::Created,
		EngineTransferEvent::Changed { old, new } => {
			debug!("TransferChanged ({:?} -> {:?})", old, new);
			TransferEvent::Changed { old, new }
		}
		EngineTransferEvent::Deleted => TransferEvent::Deleted,
	};
	system.announce_transfer_event(manager, wallet, transfer, event);
}

impl EngineListener for EventDispatcher {
	fn system_event(&self, token: SessionToken, system: Owned<SystemKind>, event: EngineSystemEvent) {
		self.on_lifecycle("SystemEvent", token, move |session| {
			let _system = system;
			dispatch_system_event(&session, event);
		});
	}

	fn network_event(&self, token: SessionToken, network: Owned<NetworkKind>, event: EngineNetworkEvent) {
		self.on_lifecycle("NetworkEvent", token, move |session| {
			dispatch_network_event(&session, network, event);
		});
	}

	fn manager_event(&self, token: SessionToken, manager: Owned<ManagerKind>, event: EngineManagerEvent) {
		self.on_lifecycle("WalletManagerEvent", token, move |session| {
			dispatch_manager_event(&session, manager, event);
		});
	}

	fn wallet_event(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		wallet: Owned<WalletKind>,
		event: EngineWalletEvent,
	) {
		self.on_lifecycle("WalletEvent", token, move |session| {
			dispatch_wallet_event(&session, manager, wallet, event);
		});
	}

	fn transfer_event(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		wallet: Owned<WalletKind>,
		transfer: Owned<TransferKind>,
		event: EngineTransferEvent,
	) {
		self.on_lifecycle("TransferEvent", token, move |session| {
			dispatch_transfer_event(&session, manager, wallet, transfer, event);
		});
	}
}

impl EngineClient for EventDispatcher {
	fn get_block_number(&self, token: SessionToken, manager: Owned<ManagerKind>, state: CallbackState) {
		debug!("GetBlockNumber");
		self.on_query(
			token,
			Completion::<BlockNumber>::new(manager, state),
			query_adapter::get_block_number,
		);
	}

	fn get_transactions(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		state: CallbackState,
		addresses: Vec<String>,
		begin_block_number: u64,
		end_block_number: u64,
	) {
		debug!("GetTransactions ({} -> {})", begin_block_number, end_block_number);
		self.on_query(
			token,
			Completion::<Transactions>::new(manager, state),
			move |system, manager, completion| {
				query_adapter::get_transactions(
					system,
					manager,
					completion,
					addresses,
					begin_block_number,
					end_block_number,
				)
			},
		);
	}

	fn get_transfers(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		state: CallbackState,
		addresses: Vec<String>,
		begin_block_number: u64,
		end_block_number: u64,
	) {
		debug!("GetTransfers ({} -> {})", begin_block_number, end_block_number);
		self.on_query(
			token,
			Completion::<Transfers>::new(manager, state),
			move |system, manager, completion| {
				query_adapter::get_transfers(
					system,
					manager,
					completion,
					addresses,
					begin_block_number,
					end_block_number,
				)
			},
		);
	}

	fn submit_transaction(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		state: CallbackState,
		identifier: String,
		transaction: Vec<u8>,
	) {
		debug!("SubmitTransaction");
		self.on_query(
			token,
			Completion::<Submitted>::new(manager, state),
			move |system, manager, completion| {
				query_adapter::submit_transaction(system, manager, completion, identifier, transaction)
			},
		);
	}

	fn estimate_transaction_fee(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		state: CallbackState,
		transaction: Vec<u8>,
	) {
		debug!("EstimateTransactionFee");
		self.on_query(
			token,
			Completion::<FeeEstimated>::new(manager, state),
			move |system, manager, completion| {
				query_adapter::estimate_transaction_fee(system, manager, completion, transaction)
			},
		);
	}
}

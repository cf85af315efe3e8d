//! The session object.
//!
//! A [`System`] owns one engine system, the application listener with its delivery pump, the
//! data service used to answer engine queries, and the bookkeeping for queries in flight and
//! fee estimations pending. It is created and torn down through the
//! [`Bridge`](crate::system::Bridge).

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::client::{BlockchainFee, DataService};
use crate::engine::{AccountInfo, Amount, NetworkFee, Owned, SessionToken, SyncEngine, SystemKind};
use crate::system::coordinator::{CallbackCoordinator, FeeEstimate};
use crate::system::currency::currency_bundle;
use crate::system::entities::{Network, Transfer, Wallet, WalletManager};
use crate::system::events::{
	NetworkEvent, SystemEvent, SystemListener, TransferEvent, WalletEvent, WalletManagerEvent,
};
use crate::system::pump::Pump;
use crate::system::resolver::HandleResolver;
use crate::system::types::{CurrencyUpdateError, FeeEstimationError, NetworkFeeUpdateError};

type QueryTracker = Arc<Mutex<HashMap<u64, AbortHandle>>>;

pub struct System {
	token: SessionToken,
	core: Owned<SystemKind>,
	account: AccountInfo,
	storage_path: PathBuf,
	is_mainnet: bool,
	listener: Arc<dyn SystemListener>,
	/// Caller-supplied queue on which events reach the listener.
	delivery: Pump,
	query: Arc<dyn DataService>,
	coordinator: CallbackCoordinator,
	queries: QueryTracker,
	next_query: AtomicU64,
}

impl System {
	#[allow(clippy::too_many_arguments)]
	pub(crate) fn new(
		token: SessionToken,
		core: Owned<SystemKind>,
		account: AccountInfo,
		storage_path: PathBuf,
		is_mainnet: bool,
		listener: Arc<dyn SystemListener>,
		delivery: Pump,
		query: Arc<dyn DataService>,
	) -> Self {
		Self {
			token,
			core,
			account,
			storage_path,
			is_mainnet,
			listener,
			delivery,
			query,
			coordinator: CallbackCoordinator::new(),
			queries: Arc::new(Mutex::new(HashMap::new())),
			next_query: AtomicU64::new(0),
		}
	}

	pub fn token(&self) -> SessionToken {
		self.token
	}

	pub fn account(&self) -> &AccountInfo {
		&self.account
	}

	pub fn storage_path(&self) -> &Path {
		&self.storage_path
	}

	pub fn is_mainnet(&self) -> bool {
		self.is_mainnet
	}

	pub(crate) fn core(&self) -> &Owned<SystemKind> {
		&self.core
	}

	pub(crate) fn engine(&self) -> &Arc<dyn SyncEngine> {
		self.core.engine()
	}

	pub(crate) fn resolver(&self) -> HandleResolver<'_> {
		HandleResolver::new(&self.core)
	}

	pub(crate) fn coordinator(&self) -> &CallbackCoordinator {
		&self.coordinator
	}

	pub(crate) fn query(&self) -> &Arc<dyn DataService> {
		&self.query
	}

	pub fn networks(&self) -> Vec<Network> {
		let engine = self.engine();
		engine
			.networks(self.core.id())
			.into_iter()
			.map(|id| Network::new(Owned::adopt(engine.clone(), id)))
			.collect()
	}

	pub fn wallet_managers(&self) -> Vec<WalletManager> {
		let engine = self.engine();
		engine
			.managers(self.core.id())
			.into_iter()
			.map(|id| WalletManager::new(Owned::adopt(engine.clone(), id)))
			.collect()
	}

	pub fn wallets(&self) -> Vec<Wallet> {
		self.wallet_managers()
			.iter()
			.flat_map(WalletManager::wallets)
			.collect()
	}

	pub(crate) fn start(&self) {
		self.engine().start_system(self.core.id());
	}

	/// Refresh network fees and currencies from the data service.
	pub async fn configure(&self) {
		debug!(token = %self.token, "Configure");
		let (fees, currencies) = futures::join!(self.update_network_fees(), self.update_currencies());
		if let Err(e) = fees {
			warn!(token = %self.token, "Configure: {}", e);
		}
		if let Err(e) = currencies {
			warn!(token = %self.token, "Configure: {}", e);
		}
	}

	/// Disconnect every wallet manager and cancel every query in flight.
	pub fn pause(&self) {
		debug!(token = %self.token, "Pause");
		for manager in self.wallet_managers() {
			manager.disconnect();
		}
		self.cancel_queries();
	}

	/// Refresh from the data service, then reconnect every wallet manager.
	pub async fn resume(&self) {
		debug!(token = %self.token, "Resume");
		self.configure().await;
		for manager in self.wallet_managers() {
			manager.connect();
		}
	}

	pub fn stop_all(&self) {
		for manager in self.wallet_managers() {
			manager.stop();
		}
	}

	pub fn set_network_reachable(&self, reachable: bool) {
		self.engine().set_reachable(self.core.id(), reachable);
	}

	/// Update height, verified block hash and fees of every network the data service knows.
	///
	/// # Returns
	/// The networks that were updated.
	pub async fn update_network_fees(&self) -> Result<Vec<Network>, NetworkFeeUpdateError> {
		let blockchains = self.query.get_blockchains(self.is_mainnet).await.map_err(|e| {
			warn!(token = %self.token, "Blockchains unavailable: {}", e);
			NetworkFeeUpdateError::FeesUnavailable
		})?;

		let networks: HashMap<String, Network> = self
			.networks()
			.into_iter()
			.map(|network| (network.uids(), network))
			.collect();

		let mut updated = Vec::new();
		for blockchain in blockchains {
			let Some(network) = networks.get(&blockchain.id) else {
				continue;
			};

			if let Some(height) = blockchain.block_height {
				network.set_height(height);
			}
			if let Some(hash) = &blockchain.verified_block_hash {
				network.set_verified_block_hash(hash);
			}

			let fees = blockchain.fee_estimates.iter().filter_map(network_fee).collect();
			network.set_fees(fees);
			updated.push(network.clone());
		}

		Ok(updated)
	}

	/// Announce the data service's verified currencies to the engine.
	///
	/// # Returns
	/// The session's networks after the announcement.
	pub async fn update_currencies(&self) -> Result<Vec<Network>, CurrencyUpdateError> {
		let currencies = self
			.query
			.get_currencies(None, self.is_mainnet)
			.await
			.map_err(|e| {
				warn!(token = %self.token, "Currencies unavailable: {}", e);
				CurrencyUpdateError::CurrenciesUnavailable
			})?;

		let bundles = currencies.iter().map(currency_bundle).collect();
		self.engine().announce_currencies(self.core.id(), bundles);
		Ok(self.networks())
	}

	/// Delete the persisted state of `network`, unless a wallet manager is using it.
	pub fn wipe_network(&self, network: &Network) {
		let in_use = self
			.wallet_managers()
			.iter()
			.any(|manager| manager.network() == *network);

		if in_use {
			warn!(token = %self.token, "Not wiping {:?}: a wallet manager is using it", network);
			return;
		}
		self.engine().wipe_network(network.id(), &self.storage_path);
	}

	/// Estimate the fee of sending `amount` from `wallet` to `target`.
	pub async fn estimate_fee_basis(
		&self,
		wallet: &Wallet,
		target: &str,
		amount: &Amount,
		fee: &NetworkFee,
	) -> FeeEstimate {
		let (cookie, outcome) = self.coordinator.register();
		wallet.estimate_fee_basis(cookie, target, amount, fee);
		outcome.await.unwrap_or(Err(FeeEstimationError::Cancelled))
	}

	pub(crate) fn announce_system_event(self: &Arc<Self>, event: SystemEvent) {
		let system = self.clone();
		self.delivery
			.submit(move || system.listener.handle_system_event(&system, event));
	}

	pub(crate) fn announce_network_event(self: &Arc<Self>, network: Network, event: NetworkEvent) {
		let system = self.clone();
		self.delivery
			.submit(move || system.listener.handle_network_event(&system, network, event));
	}

	pub(crate) fn announce_manager_event(self: &Arc<Self>, manager: WalletManager, event: WalletManagerEvent) {
		let system = self.clone();
		self.delivery
			.submit(move || system.listener.handle_manager_event(&system, manager, event));
	}

	pub(crate) fn announce_wallet_event(
		self: &Arc<Self>,
		manager: WalletManager,
		wallet: Wallet,
		event: WalletEvent,
	) {
		let system = self.clone();
		self.delivery.submit(move || {
			system
				.listener
				.handle_wallet_event(&system, manager, wallet, event)
		});
	}

	pub(crate) fn announce_transfer_event(
		self: &Arc<Self>,
		manager: WalletManager,
		wallet: Wallet,
		transfer: Transfer,
		event: TransferEvent,
	) {
		let system = self.clone();
		self.delivery.submit(move || {
			system
				.listener
				.handle_transfer_event(&system, manager, wallet, transfer, event)
		});
	}

	/// Wait until every event announced so far has reached the listener.
	pub async fn flush_delivery(&self) {
		self.delivery.flush().await;
	}

	/// Run a data service query as its own task, tracked so teardown can abort it.
	pub(crate) fn spawn_query<F>(&self, query: F)
	where
		F: Future<Output = ()> + Send + 'static,
	{
		let id = self.next_query.fetch_add(1, Ordering::Relaxed);
		let tracker = self.queries.clone();

		// Hold the lock across spawn so the task cannot untrack itself before it is tracked.
		let mut queries = self.queries.lock().unwrap_or_else(PoisonError::into_inner);
		let task = tokio::spawn(async move {
			query.await;
			tracker.lock().unwrap_or_else(PoisonError::into_inner).remove(&id);
		});
		queries.insert(id, task.abort_handle());
	}

	/// Abort every tracked query task and cancel requests in flight at the data service.
	pub(crate) fn cancel_queries(&self) {
		let aborted: Vec<AbortHandle> = self
			.queries
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.drain()
			.map(|(_, handle)| handle)
			.collect();

		if !aborted.is_empty() {
			info!(token = %self.token, "Cancelling {} queries", aborted.len());
		}
		for handle in aborted {
			handle.abort();
		}
		self.query.cancel_all();
	}

	#[cfg(test)]
	pub(crate) fn queries_in_flight(&self) -> usize {
		self.queries.lock().unwrap_or_else(PoisonError::into_inner).len()
	}
}

/// Convert an advertised fee tier; tiers whose amount is not a base-unit integer are skipped.
fn network_fee(estimate: &BlockchainFee) -> Option<NetworkFee> {
	if estimate.fee.amount.parse::<u128>().is_err() {
		debug!("Skipping unparsable fee {:?}", estimate.fee.amount);
		return None;
	}
	Some(NetworkFee {
		confirmation_time_ms: estimate.confirmation_time_ms,
		amount: Amount {
			value: estimate.fee.amount.clone(),
			currency: estimate.fee.currency.clone(),
		},
	})
}

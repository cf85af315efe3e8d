//! In-memory engine and data service used by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::client::{
	Blockchain, Currency, DataService, HederaAccount, QueryError, RawTransaction, TransactionFee,
	TransactionIdentifier, TransactionQuery,
};
use crate::engine::{
	AccountInfo, Amount, CallbackState, CurrencyBundle, EngineClient, EngineListener, HandleId,
	HandleKind, NetworkFee, NetworkType, OperationCookie, Owned, SessionToken, SyncEngine,
	SystemSpec, TransactionBundle, TransferBundle,
};
use crate::system::events::{
	NetworkEvent, SystemEvent, SystemListener, TransferEvent, WalletEvent, WalletManagerEvent,
};
use crate::system::pump::Pump;
use crate::system::session::System;
use crate::system::{Network, Transfer, Wallet, WalletManager};

/// A completion the bridge reported to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionRecord {
	BlockNumber {
		state: CallbackState,
		success: bool,
		block_number: u64,
		verified_block_hash: String,
	},
	Transactions {
		state: CallbackState,
		success: bool,
		bundles: Vec<TransactionBundle>,
	},
	Transfers {
		state: CallbackState,
		success: bool,
		bundles: Vec<TransferBundle>,
	},
	Submit {
		state: CallbackState,
		identifier: Option<String>,
		hash: Option<String>,
		success: bool,
	},
	EstimateFee {
		state: CallbackState,
		success: bool,
		cost_units: u64,
		properties: HashMap<String, String>,
	},
}

#[derive(Default)]
struct EngineState {
	outstanding: HashMap<HandleId, i64>,
	releases: HashMap<HandleId, usize>,
	networks: Vec<(HandleId, String, NetworkType)>,
	managers: Vec<(HandleId, HandleId)>,
	wallets: HashMap<HandleId, Vec<HandleId>>,
	transfers: HashMap<HandleId, HashSet<HandleId>>,
	fees: HashMap<HandleId, Vec<NetworkFee>>,
	heights: HashMap<HandleId, u64>,
	currencies: Vec<String>,
	connects: HashMap<HandleId, usize>,
	disconnects: HashMap<HandleId, usize>,
	stops: HashMap<HandleId, usize>,
	wiped: Vec<HandleId>,
	estimate_cookie: Option<OperationCookie>,
	initialization_data: HashMap<HandleId, Vec<u8>>,
	initialized: HashSet<HandleId>,
	completions: Vec<CompletionRecord>,
	starts: usize,
	refuse: bool,
	listener: Option<Arc<dyn EngineListener>>,
}

/// Engine double that tracks ownership grants and records every call.
#[derive(Default)]
pub struct MockEngine {
	state: Mutex<EngineState>,
}

impl MockEngine {
	pub const SYSTEM: HandleId = HandleId(1);

	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	fn state(&self) -> MutexGuard<'_, EngineState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn issue(state: &mut EngineState, id: HandleId) -> HandleId {
		*state.outstanding.entry(id).or_default() += 1;
		id
	}

	/// Issue a fresh grant on `id`, as the engine does when passing a handle to a callback.
	pub fn grant<K: HandleKind>(self: &Arc<Self>, id: HandleId) -> Owned<K> {
		Self::issue(&mut self.state(), id);
		let engine: Arc<dyn SyncEngine> = self.clone();
		Owned::adopt(engine, id)
	}

	pub fn outstanding(&self, id: HandleId) -> i64 {
		self.state().outstanding.get(&id).copied().unwrap_or(0)
	}

	pub fn release_count(&self, id: HandleId) -> usize {
		self.state().releases.get(&id).copied().unwrap_or(0)
	}

	pub fn add_network(&self, id: HandleId, uids: &str, network_type: NetworkType) {
		self.state().networks.push((id, uids.to_string(), network_type));
	}

	pub fn add_manager(&self, id: HandleId, network: HandleId) {
		self.state().managers.push((id, network));
	}

	pub fn add_wallet(&self, manager: HandleId, wallet: HandleId) {
		self.state().wallets.entry(manager).or_default().push(wallet);
	}

	pub fn add_transfer(&self, wallet: HandleId, transfer: HandleId) {
		self.state().transfers.entry(wallet).or_default().insert(transfer);
	}

	pub fn remove_transfer(&self, wallet: HandleId, transfer: HandleId) {
		if let Some(transfers) = self.state().transfers.get_mut(&wallet) {
			transfers.remove(&transfer);
		}
	}

	pub fn network_fees(&self, network: HandleId) -> Vec<NetworkFee> {
		self.state().fees.get(&network).cloned().unwrap_or_default()
	}

	pub fn network_height(&self, network: HandleId) -> Option<u64> {
		self.state().heights.get(&network).copied()
	}

	pub fn announced_currencies(&self) -> Vec<String> {
		self.state().currencies.clone()
	}

	pub fn connect_count(&self, manager: HandleId) -> usize {
		self.state().connects.get(&manager).copied().unwrap_or(0)
	}

	pub fn disconnect_count(&self, manager: HandleId) -> usize {
		self.state().disconnects.get(&manager).copied().unwrap_or(0)
	}

	pub fn stop_count(&self, manager: HandleId) -> usize {
		self.state().stops.get(&manager).copied().unwrap_or(0)
	}

	pub fn start_count(&self) -> usize {
		self.state().starts
	}

	pub fn wiped_networks(&self) -> Vec<HandleId> {
		self.state().wiped.clone()
	}

	pub fn last_estimate_cookie(&self) -> Option<OperationCookie> {
		self.state().estimate_cookie
	}

	pub fn set_initialization_data(&self, network: HandleId, data: Option<Vec<u8>>) {
		let mut state = self.state();
		match data {
			Some(data) => state.initialization_data.insert(network, data),
			None => state.initialization_data.remove(&network),
		};
	}

	pub fn mark_initialized(&self, network: HandleId) {
		self.state().initialized.insert(network);
	}

	pub fn refuse_systems(&self) {
		self.state().refuse = true;
	}

	/// The listener registered by the most recent `create_system`.
	pub fn listener(&self) -> Option<Arc<dyn EngineListener>> {
		self.state().listener.clone()
	}

	pub fn completions(&self) -> Vec<CompletionRecord> {
		self.state().completions.clone()
	}

	fn record(&self, completion: CompletionRecord) {
		self.state().completions.push(completion);
	}

	fn count(counts: &mut HashMap<HandleId, usize>, id: HandleId) {
		*counts.entry(id).or_default() += 1;
	}
}

impl SyncEngine for MockEngine {
	fn retain(&self, id: HandleId) {
		Self::issue(&mut self.state(), id);
	}

	fn release(&self, id: HandleId) {
		let mut state = self.state();
		*state.outstanding.entry(id).or_default() -= 1;
		Self::count(&mut state.releases, id);
	}

	fn create_system(
		&self,
		_token: SessionToken,
		_spec: &SystemSpec,
		listener: Arc<dyn EngineListener>,
		_client: Arc<dyn EngineClient>,
	) -> Option<HandleId> {
		let previous = {
			let mut state = self.state();
			if state.refuse {
				return None;
			}
			Self::issue(&mut state, Self::SYSTEM);
			state.listener.replace(listener)
		};
		drop(previous);
		Some(Self::SYSTEM)
	}

	fn start_system(&self, _system: HandleId) {
		self.state().starts += 1;
	}

	fn set_reachable(&self, _system: HandleId, _reachable: bool) {}

	fn networks(&self, _system: HandleId) -> Vec<HandleId> {
		let mut state = self.state();
		let ids: Vec<HandleId> = state.networks.iter().map(|(id, ..)| *id).collect();
		ids.into_iter().map(|id| Self::issue(&mut state, id)).collect()
	}

	fn managers(&self, _system: HandleId) -> Vec<HandleId> {
		let mut state = self.state();
		let ids: Vec<HandleId> = state.managers.iter().map(|(id, _)| *id).collect();
		ids.into_iter().map(|id| Self::issue(&mut state, id)).collect()
	}

	fn wallets(&self, manager: HandleId) -> Vec<HandleId> {
		let mut state = self.state();
		let ids = state.wallets.get(&manager).cloned().unwrap_or_default();
		ids.into_iter().map(|id| Self::issue(&mut state, id)).collect()
	}

	fn has_network(&self, _system: HandleId, network: HandleId) -> bool {
		self.state().networks.iter().any(|(id, ..)| *id == network)
	}

	fn has_manager(&self, _system: HandleId, manager: HandleId) -> bool {
		self.state().managers.iter().any(|(id, _)| *id == manager)
	}

	fn has_wallet(&self, manager: HandleId, wallet: HandleId) -> bool {
		self.state()
			.wallets
			.get(&manager)
			.is_some_and(|wallets| wallets.contains(&wallet))
	}

	fn has_transfer(&self, wallet: HandleId, transfer: HandleId) -> bool {
		self.state()
			.transfers
			.get(&wallet)
			.is_some_and(|transfers| transfers.contains(&transfer))
	}

	fn manager_network(&self, manager: HandleId) -> HandleId {
		let mut state = self.state();
		let network = state
			.managers
			.iter()
			.find(|(id, _)| *id == manager)
			.map(|(_, network)| *network)
			.unwrap_or(HandleId(0));
		Self::issue(&mut state, network)
	}

	fn network_uids(&self, network: HandleId) -> String {
		self.state()
			.networks
			.iter()
			.find(|(id, ..)| *id == network)
			.map(|(_, uids, _)| uids.clone())
			.unwrap_or_default()
	}

	fn network_type(&self, network: HandleId) -> NetworkType {
		self.state()
			.networks
			.iter()
			.find(|(id, ..)| *id == network)
			.map(|(.., network_type)| *network_type)
			.unwrap_or(NetworkType::Btc)
	}

	fn transfer_uids(&self, _transfer: HandleId) -> Option<String> {
		None
	}

	fn network_set_height(&self, network: HandleId, height: u64) {
		self.state().heights.insert(network, height);
	}

	fn network_set_verified_block_hash(&self, _network: HandleId, _hash: &str) {}

	fn network_set_fees(&self, network: HandleId, fees: Vec<NetworkFee>) {
		self.state().fees.insert(network, fees);
	}

	fn announce_currencies(&self, _system: HandleId, bundles: Vec<CurrencyBundle>) {
		self.state()
			.currencies
			.extend(bundles.into_iter().map(|bundle| bundle.id));
	}

	fn manager_connect(&self, manager: HandleId) {
		Self::count(&mut self.state().connects, manager);
	}

	fn manager_disconnect(&self, manager: HandleId) {
		Self::count(&mut self.state().disconnects, manager);
	}

	fn manager_stop(&self, manager: HandleId) {
		Self::count(&mut self.state().stops, manager);
	}

	fn wipe_network(&self, network: HandleId, _storage_path: &Path) {
		self.state().wiped.push(network);
	}

	fn wallet_estimate_fee_basis(
		&self,
		_wallet: HandleId,
		cookie: OperationCookie,
		_target: &str,
		_amount: &Amount,
		_fee: &NetworkFee,
	) {
		self.state().estimate_cookie = Some(cookie);
	}

	fn account_is_initialized(&self, _system: HandleId, network: HandleId) -> bool {
		self.state().initialized.contains(&network)
	}

	fn account_initialization_data(&self, _system: HandleId, network: HandleId) -> Option<Vec<u8>> {
		self.state().initialization_data.get(&network).cloned()
	}

	fn account_initialize(&self, _system: HandleId, network: HandleId, data: &[u8]) -> Option<Vec<u8>> {
		self.state().initialized.insert(network);
		Some(data.to_vec())
	}

	fn announce_block_number(
		&self,
		_manager: HandleId,
		state: CallbackState,
		success: bool,
		block_number: u64,
		verified_block_hash: &str,
	) {
		self.record(CompletionRecord::BlockNumber {
			state,
			success,
			block_number,
			verified_block_hash: verified_block_hash.to_string(),
		});
	}

	fn announce_transactions(
		&self,
		_manager: HandleId,
		state: CallbackState,
		success: bool,
		bundles: Vec<TransactionBundle>,
	) {
		self.record(CompletionRecord::Transactions { state, success, bundles });
	}

	fn announce_transfers(
		&self,
		_manager: HandleId,
		state: CallbackState,
		success: bool,
		bundles: Vec<TransferBundle>,
	) {
		self.record(CompletionRecord::Transfers { state, success, bundles });
	}

	fn announce_submit_transfer(
		&self,
		_manager: HandleId,
		state: CallbackState,
		identifier: Option<String>,
		hash: Option<String>,
		success: bool,
	) {
		self.record(CompletionRecord::Submit {
			state,
			identifier,
			hash,
			success,
		});
	}

	fn announce_estimate_fee(
		&self,
		_manager: HandleId,
		state: CallbackState,
		success: bool,
		cost_units: u64,
		properties: HashMap<String, String>,
	) {
		self.record(CompletionRecord::EstimateFee {
			state,
			success,
			cost_units,
			properties,
		});
	}
}

#[derive(Default)]
struct Script {
	blockchains: Option<Vec<Blockchain>>,
	currencies: Option<Vec<Currency>>,
	transactions: Option<Vec<RawTransaction>>,
	hang_transactions: bool,
	submission: Option<TransactionIdentifier>,
	fee_estimate: Option<TransactionFee>,
	hedera_lookups: VecDeque<Option<Vec<HederaAccount>>>,
	hedera_creations: VecDeque<Option<Vec<HederaAccount>>>,
	transaction_queries: Vec<TransactionQuery>,
	hedera_public_keys: Vec<String>,
	creation_count: usize,
	cancels: usize,
}

/// Data service double answering from scripted responses; anything unscripted is `NoData`.
#[derive(Default)]
pub struct ScriptedDataService {
	script: Mutex<Script>,
}

impl ScriptedDataService {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	fn script(&self) -> MutexGuard<'_, Script> {
		self.script.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn set_blockchains(&self, blockchains: Option<Vec<Blockchain>>) {
		self.script().blockchains = blockchains;
	}

	pub fn set_currencies(&self, currencies: Option<Vec<Currency>>) {
		self.script().currencies = currencies;
	}

	pub fn set_transactions(&self, transactions: Option<Vec<RawTransaction>>) {
		self.script().transactions = transactions;
	}

	/// Make every transaction query wait until it is cancelled.
	pub fn hang_transactions(&self) {
		self.script().hang_transactions = true;
	}

	pub fn set_submission(&self, submission: Option<TransactionIdentifier>) {
		self.script().submission = submission;
	}

	pub fn set_fee_estimate(&self, fee: Option<TransactionFee>) {
		self.script().fee_estimate = fee;
	}

	pub fn push_hedera_lookup(&self, accounts: Option<Vec<HederaAccount>>) {
		self.script().hedera_lookups.push_back(accounts);
	}

	pub fn push_hedera_creation(&self, accounts: Option<Vec<HederaAccount>>) {
		self.script().hedera_creations.push_back(accounts);
	}

	pub fn transaction_queries(&self) -> Vec<TransactionQuery> {
		self.script().transaction_queries.clone()
	}

	pub fn hedera_public_keys(&self) -> Vec<String> {
		self.script().hedera_public_keys.clone()
	}

	pub fn hedera_creations(&self) -> usize {
		self.script().creation_count
	}

	pub fn cancel_count(&self) -> usize {
		self.script().cancels
	}
}

#[async_trait::async_trait]
impl DataService for ScriptedDataService {
	async fn get_blockchains(&self, _is_mainnet: bool) -> Result<Vec<Blockchain>, QueryError> {
		self.script().blockchains.clone().ok_or(QueryError::NoData)
	}

	async fn get_blockchain(&self, blockchain_id: &str) -> Result<Blockchain, QueryError> {
		self.script()
			.blockchains
			.iter()
			.flatten()
			.find(|blockchain| blockchain.id == blockchain_id)
			.cloned()
			.ok_or(QueryError::NoData)
	}

	async fn get_currencies(
		&self,
		_blockchain_id: Option<&str>,
		_is_mainnet: bool,
	) -> Result<Vec<Currency>, QueryError> {
		self.script().currencies.clone().ok_or(QueryError::NoData)
	}

	async fn get_transactions(&self, query: TransactionQuery) -> Result<Vec<RawTransaction>, QueryError> {
		let (hang, transactions) = {
			let mut script = self.script();
			script.transaction_queries.push(query);
			(script.hang_transactions, script.transactions.clone())
		};
		if hang {
			std::future::pending::<()>().await;
		}
		transactions.ok_or(QueryError::NoData)
	}

	async fn create_transaction(
		&self,
		_blockchain_id: &str,
		_transaction: &[u8],
		_identifier: &str,
	) -> Result<TransactionIdentifier, QueryError> {
		self.script().submission.clone().ok_or(QueryError::NoData)
	}

	async fn estimate_transaction_fee(
		&self,
		_blockchain_id: &str,
		_transaction: &[u8],
	) -> Result<TransactionFee, QueryError> {
		self.script().fee_estimate.clone().ok_or(QueryError::NoData)
	}

	async fn get_hedera_account(
		&self,
		_blockchain_id: &str,
		public_key: &str,
	) -> Result<Vec<HederaAccount>, QueryError> {
		let mut script = self.script();
		script.hedera_public_keys.push(public_key.to_string());
		script.hedera_lookups.pop_front().flatten().ok_or(QueryError::NoData)
	}

	async fn create_hedera_account(
		&self,
		_blockchain_id: &str,
		_public_key: &str,
	) -> Result<Vec<HederaAccount>, QueryError> {
		let mut script = self.script();
		script.creation_count += 1;
		script.hedera_creations.pop_front().flatten().ok_or(QueryError::NoData)
	}

	fn cancel_all(&self) {
		self.script().cancels += 1;
	}
}

/// Listener recording every delivered event as `(kind, Debug of the event)`.
#[derive(Default)]
pub struct RecordingListener {
	events: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingListener {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	fn push(&self, kind: &'static str, event: String) {
		self.events
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push((kind, event));
	}

	fn recorded(&self) -> Vec<(&'static str, String)> {
		self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}

	pub fn kinds(&self) -> Vec<&'static str> {
		self.recorded().into_iter().map(|(kind, _)| kind).collect()
	}

	pub fn events(&self) -> Vec<String> {
		self.recorded().into_iter().map(|(_, event)| event).collect()
	}
}

impl SystemListener for RecordingListener {
	fn handle_system_event(&self, _system: &System, event: SystemEvent) {
		self.push("system", format!("{:?}", event));
	}

	fn handle_network_event(&self, _system: &System, _network: Network, event: NetworkEvent) {
		self.push("network", format!("{:?}", event));
	}

	fn handle_manager_event(&self, _system: &System, _manager: WalletManager, event: WalletManagerEvent) {
		self.push("manager", format!("{:?}", event));
	}

	fn handle_wallet_event(&self, _system: &System, _manager: WalletManager, _wallet: Wallet, event: WalletEvent) {
		self.push("wallet", format!("{:?}", event));
	}

	fn handle_transfer_event(
		&self,
		_system: &System,
		_manager: WalletManager,
		_wallet: Wallet,
		_transfer: Transfer,
		event: TransferEvent,
	) {
		self.push("transfer", format!("{:?}", event));
	}
}

/// A session on `engine`'s system, not registered anywhere, with a throwaway listener.
pub fn system(engine: &Arc<MockEngine>, query: Arc<ScriptedDataService>) -> Arc<System> {
	system_with_listener(engine, query, RecordingListener::new())
}

pub fn system_with_listener(
	engine: &Arc<MockEngine>,
	query: Arc<ScriptedDataService>,
	listener: Arc<RecordingListener>,
) -> Arc<System> {
	Arc::new(System::new(
		SessionToken(1),
		engine.grant(MockEngine::SYSTEM),
		AccountInfo {
			filesystem_identifier: "test-account".to_string(),
		},
		PathBuf::from("wallet-sync-test").join("test-account"),
		true,
		listener,
		Pump::spawn("delivery"),
		query,
	))
}

//! Boundary to the native synchronization engine.
//!
//! The engine is an opaque service: it owns networks, wallet managers, wallets and transfers,
//! hands out [`Owned`] references to them, emits lifecycle events through an
//! [`EngineListener`] and asks for blockchain data through an [`EngineClient`]. Both callback
//! traits are keyed by the [`SessionToken`] supplied when the system was created. Data-fetch
//! requests are answered through the `announce_*` completion entry points of [`SyncEngine`].

/// Owned entity references with release-on-drop
pub mod handle;
/// Events, states and bundles crossing the engine boundary
pub mod types;

pub use handle::*;
pub use types::*;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Operations the native engine exposes to the bridge.
///
/// Every `HandleId` returned from an accessor (`networks`, `managers`, `wallets`,
/// `manager_network`) carries a fresh grant the caller must adopt with [`Owned::adopt`].
pub trait SyncEngine: Send + Sync {
	fn retain(&self, id: HandleId);
	fn release(&self, id: HandleId);

	/// Create the engine system for a session. `None` if the engine refuses.
	fn create_system(
		&self,
		token: SessionToken,
		spec: &SystemSpec,
		listener: Arc<dyn EngineListener>,
		client: Arc<dyn EngineClient>,
	) -> Option<HandleId>;
	fn start_system(&self, system: HandleId);
	fn set_reachable(&self, system: HandleId, reachable: bool);

	fn networks(&self, system: HandleId) -> Vec<HandleId>;
	fn managers(&self, system: HandleId) -> Vec<HandleId>;
	fn wallets(&self, manager: HandleId) -> Vec<HandleId>;

	fn has_network(&self, system: HandleId, network: HandleId) -> bool;
	fn has_manager(&self, system: HandleId, manager: HandleId) -> bool;
	fn has_wallet(&self, manager: HandleId, wallet: HandleId) -> bool;
	fn has_transfer(&self, wallet: HandleId, transfer: HandleId) -> bool;

	fn manager_network(&self, manager: HandleId) -> HandleId;
	fn network_uids(&self, network: HandleId) -> String;
	fn network_type(&self, network: HandleId) -> NetworkType;
	fn transfer_uids(&self, transfer: HandleId) -> Option<String>;

	fn network_set_height(&self, network: HandleId, height: u64);
	fn network_set_verified_block_hash(&self, network: HandleId, hash: &str);
	fn network_set_fees(&self, network: HandleId, fees: Vec<NetworkFee>);
	fn announce_currencies(&self, system: HandleId, bundles: Vec<CurrencyBundle>);

	fn manager_connect(&self, manager: HandleId);
	fn manager_disconnect(&self, manager: HandleId);
	fn manager_stop(&self, manager: HandleId);
	fn wipe_network(&self, network: HandleId, storage_path: &Path);

	/// Start a fee estimation; the outcome arrives as `EngineWalletEvent::FeeBasisEstimated`
	/// carrying `cookie`.
	fn wallet_estimate_fee_basis(
		&self,
		wallet: HandleId,
		cookie: OperationCookie,
		target: &str,
		amount: &Amount,
		fee: &NetworkFee,
	);

	fn account_is_initialized(&self, system: HandleId, network: HandleId) -> bool;
	fn account_initialization_data(&self, system: HandleId, network: HandleId) -> Option<Vec<u8>>;
	fn account_initialize(&self, system: HandleId, network: HandleId, data: &[u8]) -> Option<Vec<u8>>;

	fn announce_block_number(
		&self,
		manager: HandleId,
		state: CallbackState,
		success: bool,
		block_number: u64,
		verified_block_hash: &str,
	);
	fn announce_transactions(
		&self,
		manager: HandleId,
		state: CallbackState,
		success: bool,
		bundles: Vec<TransactionBundle>,
	);
	fn announce_transfers(
		&self,
		manager: HandleId,
		state: CallbackState,
		success: bool,
		bundles: Vec<TransferBundle>,
	);
	fn announce_submit_transfer(
		&self,
		manager: HandleId,
		state: CallbackState,
		identifier: Option<String>,
		hash: Option<String>,
		success: bool,
	);
	fn announce_estimate_fee(
		&self,
		manager: HandleId,
		state: CallbackState,
		success: bool,
		cost_units: u64,
		properties: HashMap<String, String>,
	);
}

/// Lifecycle event callbacks the engine invokes, from any thread.
///
/// Each invocation transfers ownership of its handle arguments to the callee.
pub trait EngineListener: Send + Sync {
	fn system_event(&self, token: SessionToken, system: Owned<SystemKind>, event: EngineSystemEvent);
	fn network_event(
		&self,
		token: SessionToken,
		network: Owned<NetworkKind>,
		event: EngineNetworkEvent,
	);
	fn manager_event(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		event: EngineManagerEvent,
	);
	fn wallet_event(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		wallet: Owned<WalletKind>,
		event: EngineWalletEvent,
	);
	fn transfer_event(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		wallet: Owned<WalletKind>,
		transfer: Owned<TransferKind>,
		event: EngineTransferEvent,
	);
}

/// Data-fetch callbacks the engine invokes, from any thread.
///
/// Every invocation must be answered by exactly one matching `announce_*` call on the engine.
pub trait EngineClient: Send + Sync {
	fn get_block_number(&self, token: SessionToken, manager: Owned<ManagerKind>, state: CallbackState);
	#[allow(clippy::too_many_arguments)]
	fn get_transactions(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		state: CallbackState,
		addresses: Vec<String>,
		begin_block_number: u64,
		end_block_number: u64,
	);
	#[allow(clippy::too_many_arguments)]
	fn get_transfers(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		state: CallbackState,
		addresses: Vec<String>,
		begin_block_number: u64,
		end_block_number: u64,
	);
	fn submit_transaction(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		state: CallbackState,
		identifier: String,
		transaction: Vec<u8>,
	);
	fn estimate_transaction_fee(
		&self,
		token: SessionToken,
		manager: Owned<ManagerKind>,
		state: CallbackState,
		transaction: Vec<u8>,
	);
}

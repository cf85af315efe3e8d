//! Value types exchanged with the native synchronization engine.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use super::handle::{ManagerKind, NetworkKind, Owned, TransferKind, WalletKind};

/// Block height value the engine uses for "no bound" / "not yet included".
pub const BLOCK_HEIGHT_UNBOUND: u64 = u64::MAX;

/// Correlation key passed to the engine at session creation and echoed on every callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(pub u32);

impl fmt::Display for SessionToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Opaque engine state that must be echoed back on a data-fetch completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackState(pub u64);

/// Application-chosen cookie identifying an asynchronous engine operation (fee estimation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationCookie(pub u64);

/// Parameters the engine needs to create a system for one session.
#[derive(Debug, Clone)]
pub struct SystemSpec {
	pub storage_path: PathBuf,
	pub is_mainnet: bool,
	pub account: AccountInfo,
}

/// The account a session synchronizes; key material stays inside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
	/// Stable identifier used to derive the per-account storage directory.
	pub filesystem_identifier: String,
}

/// Blockchain family of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkType {
	Btc,
	Bch,
	Bsv,
	Ltc,
	Doge,
	Eth,
	Xrp,
	Hbar,
	Xtz,
	Xlm,
	Avax,
}

impl NetworkType {
	/// Whether addresses on this network compare case-insensitively.
	pub fn has_case_insensitive_addresses(&self) -> bool {
		matches!(self, NetworkType::Eth)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
	Created,
	Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
	RequestedByClient,
	Unknown,
	Posix { errnum: i32, message: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletManagerState {
	Created,
	Disconnected(DisconnectReason),
	Connected,
	Syncing,
	Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletState {
	Created,
	Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferState {
	Created,
	Signed,
	Submitted,
	Included {
		block_number: u64,
		transaction_index: u64,
		timestamp: u64,
		success: bool,
		error: Option<String>,
	},
	Errored {
		message: String,
	},
	Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStoppedReason {
	Complete,
	Requested,
	Unknown,
	Posix { errnum: i32, message: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDepth {
	FromLastConfirmedSend,
	FromLastTrustedBlock,
	FromCreation,
}

/// Outcome status of an engine fee estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateStatus {
	Success,
	InsufficientFunds,
	ServiceUnavailable,
	ServiceError,
}

/// An amount in base units, tagged with its currency identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Amount {
	pub value: String,
	pub currency: String,
}

impl fmt::Display for Amount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.value, self.currency)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeeBasis {
	pub price_per_cost_factor: Amount,
	pub cost_factor: f64,
	pub fee: Amount,
}

/// A network fee tier announced to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkFee {
	pub confirmation_time_ms: u64,
	pub amount: Amount,
}

/// Engine-side transfer status derived from the data service's status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
	Included,
	Submitted,
	Errored,
}

/// Canonical transaction record announced in response to a transaction-history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBundle {
	pub status: TransferStatus,
	pub raw: Vec<u8>,
	pub timestamp: u64,
	pub block_height: u64,
}

/// Canonical transfer record announced in response to a transfer-history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferBundle {
	pub status: TransferStatus,
	pub hash: String,
	pub identifier: String,
	pub uids: String,
	pub source: Option<String>,
	pub target: Option<String>,
	pub amount: String,
	pub currency: String,
	pub fee: Option<String>,
	pub transfer_index: u64,
	pub block_timestamp: u64,
	pub block_number: u64,
	pub block_confirmations: u64,
	pub block_transaction_index: u64,
	pub block_hash: String,
	pub meta: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyDenominationBundle {
	pub name: String,
	pub code: String,
	pub symbol: String,
	pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyBundle {
	pub id: String,
	pub name: String,
	pub code: String,
	pub type_: String,
	pub blockchain_id: String,
	pub address: Option<String>,
	pub verified: bool,
	pub denominations: Vec<CurrencyDenominationBundle>,
}

/// System-level events emitted by the engine.
#[derive(Debug)]
pub enum EngineSystemEvent {
	Created,
	Changed { old: SystemState, new: SystemState },
	Deleted,
	NetworkAdded(Owned<NetworkKind>),
	ManagerAdded(Owned<ManagerKind>),
	DiscoveredNetworks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineNetworkEvent {
	Created,
	FeesUpdated,
	CurrenciesUpdated,
	Deleted,
}

#[derive(Debug)]
pub enum EngineManagerEvent {
	Created,
	Changed {
		old: WalletManagerState,
		new: WalletManagerState,
	},
	Deleted,
	WalletAdded(Owned<WalletKind>),
	WalletChanged(Owned<WalletKind>),
	WalletDeleted(Owned<WalletKind>),
	SyncStarted,
	/// `timestamp` is in seconds since the epoch; zero means unknown.
	SyncContinues { percent_complete: f32, timestamp: u64 },
	SyncStopped(SyncStoppedReason),
	SyncRecommended(SyncDepth),
	BlockHeightUpdated(u64),
}

#[derive(Debug)]
pub enum EngineWalletEvent {
	Created,
	Changed { old: WalletState, new: WalletState },
	Deleted,
	TransferAdded(Owned<TransferKind>),
	TransferChanged(Owned<TransferKind>),
	TransferSubmitted(Owned<TransferKind>),
	TransferDeleted(Owned<TransferKind>),
	BalanceUpdated(Amount),
	FeeBasisUpdated(FeeBasis),
	FeeBasisEstimated {
		status: EstimateStatus,
		cookie: OperationCookie,
		basis: Option<FeeBasis>,
	},
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineTransferEvent {
	Created,
	Changed { old: TransferState, new: TransferState },
	Deleted,
}

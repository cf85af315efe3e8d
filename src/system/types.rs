use crate::client::{HederaAccount, QueryError};
use crate::engine::SessionToken;

/// Errors from the session registry
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
	#[error("Session token {0} is already registered")]
	TokenInUse(SessionToken),
}

/// Errors from per-session storage management
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Storage path is not a writable directory: {0}")]
	NotWritable(String),
}

/// Errors creating a session
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),

	#[error("Registry error: {0}")]
	Registry(#[from] RegistryError),

	#[error("Engine refused to create a system for session {0}")]
	EngineRefused(SessionToken),
}

/// Invariant violations found while reconciling data service records
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReconcileError {
	#[error("Transaction {transaction_id} has {count} fee transfers")]
	MultipleFeeTransfers { transaction_id: String, count: usize },

	#[error("Transaction {transaction_id} has unknown status {status:?}")]
	UnknownStatus { transaction_id: String, status: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NetworkFeeUpdateError {
	#[error("Network fees unavailable")]
	FeesUnavailable,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CurrencyUpdateError {
	#[error("Currencies unavailable")]
	CurrenciesUnavailable,
}

#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum FeeEstimationError {
	#[error("Fee estimation service unavailable")]
	ServiceUnavailable,

	#[error("Fee estimation service error")]
	ServiceError,

	#[error("Insufficient funds")]
	InsufficientFunds,

	#[error("Fee estimation cancelled")]
	Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountInitializationError {
	#[error("Account is already initialized")]
	AlreadyInitialized,

	#[error("No account exists and creation was not requested")]
	CantCreate,

	#[error("Found {} accounts for one public key", .0.len())]
	MultipleHederaAccounts(Vec<HederaAccount>),

	#[error("Query error: {0}")]
	Query(#[from] QueryError),

	#[error("Unsupported network: {0}")]
	Unsupported(String),
}

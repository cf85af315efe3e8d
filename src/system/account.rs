//! Account initialization for networks that need an on-chain account before use.
//!
//! Hedera accounts are created by the data service for a public key. Initialization looks the
//! key up, creates an account at most once when asked to, and hands the account id to the
//! engine, which returns the serialized initialization to persist.

use tracing::info;

use crate::client::{HederaAccount, QueryError};
use crate::engine::NetworkType;
use crate::system::entities::Network;
use crate::system::session::System;
use crate::system::types::AccountInitializationError;

impl System {
	pub fn account_is_initialized(&self, network: &Network) -> bool {
		self.engine()
			.account_is_initialized(self.core().id(), network.id())
	}

	/// Initialize the session's account on `network`.
	///
	/// # Arguments
	/// * `network` - Network needing initialization.
	/// * `create` - Whether to create an account when none exists yet.
	///
	/// # Returns
	/// The serialized account initialization, to be persisted by the caller.
	pub async fn account_initialize(
		&self,
		network: &Network,
		create: bool,
	) -> Result<Vec<u8>, AccountInitializationError> {
		if self.account_is_initialized(network) {
			return Err(AccountInitializationError::AlreadyInitialized);
		}

		match network.network_type() {
			NetworkType::Hbar => self.initialize_hedera(network, create).await,
			other => Err(AccountInitializationError::Unsupported(format!("{:?}", other))),
		}
	}

	/// Initialize the account directly from externally obtained data.
	pub fn account_initialize_using_data(&self, network: &Network, data: &[u8]) -> Option<Vec<u8>> {
		self.engine()
			.account_initialize(self.core().id(), network.id(), data)
	}

	async fn initialize_hedera(
		&self,
		network: &Network,
		create: bool,
	) -> Result<Vec<u8>, AccountInitializationError> {
		let public_key = self
			.engine()
			.account_initialization_data(self.core().id(), network.id())
			.map(hex::encode)
			.ok_or(AccountInitializationError::Query(QueryError::NoData))?;
		info!("HBAR account initialize: public key {}", public_key);

		let blockchain_id = network.uids();
		let mut accounts = self
			.query()
			.get_hedera_account(&blockchain_id, &public_key)
			.await?;

		if accounts.is_empty() {
			if !create {
				return Err(AccountInitializationError::CantCreate);
			}
			accounts = self
				.query()
				.create_hedera_account(&blockchain_id, &public_key)
				.await?;
		}

		if accounts.len() > 1 {
			return Err(AccountInitializationError::MultipleHederaAccounts(accounts));
		}
		match accounts.first() {
			Some(account) => self.initialize_using_hedera(network, account),
			None => Err(AccountInitializationError::CantCreate),
		}
	}

	fn initialize_using_hedera(
		&self,
		network: &Network,
		account: &HederaAccount,
	) -> Result<Vec<u8>, AccountInitializationError> {
		info!(
			"HBAR account initialize: account {}, balance {:?}",
			account.id, account.balance
		);
		self.account_initialize_using_data(network, account.id.as_bytes())
			.ok_or(AccountInitializationError::Query(QueryError::NoData))
	}
}

//! Answers to the engine's data-fetch requests.
//!
//! Each request is answered through a [`Completion`], which owns the requesting wallet
//! manager's handle and reports exactly one outcome to the engine. A completion that is dropped
//! without an explicit report (a resolution miss, a panic, or an aborted query task) reports
//! failure with a neutral payload, so the engine never waits on a request forever.
//!
//! Data service calls run as their own tokio tasks, tracked by the session. Their continuation
//! reports straight to the engine's completion entry point; it does not go back through the
//! data pump.

use std::collections::HashMap;
use std::marker::PhantomData;

use tracing::{debug, error, warn};

use crate::client::{TransactionFee, TransactionIdentifier, TransactionQuery};
use crate::engine::{
	BLOCK_HEIGHT_UNBOUND, CallbackState, ManagerKind, Owned, SyncEngine, TransactionBundle,
	TransferBundle,
};
use crate::system::entities::WalletManager;
use crate::system::reconciler::{
	canonical_addresses, make_transaction_bundle, make_transfer_bundles,
};
use crate::system::session::System;
use crate::system::types::ReconcileError;

/// The payload of one kind of data-fetch completion.
pub trait Outcome: Sized + Send + 'static {
	const REQUEST: &'static str;

	/// Report to the engine; `None` reports failure.
	fn report(engine: &dyn SyncEngine, manager: &Owned<ManagerKind>, state: CallbackState, outcome: Option<Self>);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNumber {
	pub block_number: u64,
	pub verified_block_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transactions(pub Vec<TransactionBundle>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfers(pub Vec<TransferBundle>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
	pub identifier: String,
	pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEstimated {
	pub cost_units: u64,
	pub properties: HashMap<String, String>,
}

impl Outcome for BlockNumber {
	const REQUEST: &'static str = "GetBlockNumber";

	fn report(engine: &dyn SyncEngine, manager: &Owned<ManagerKind>, state: CallbackState, outcome: Option<Self>) {
		match outcome {
			Some(number) => engine.announce_block_number(
				manager.id(),
				state,
				true,
				number.block_number,
				&number.verified_block_hash,
			),
			None => engine.announce_block_number(manager.id(), state, false, 0, ""),
		}
	}
}

impl Outcome for Transactions {
	const REQUEST: &'static str = "GetTransactions";

	fn report(engine: &dyn SyncEngine, manager: &Owned<ManagerKind>, state: CallbackState, outcome: Option<Self>) {
		match outcome {
			Some(Transactions(bundles)) => engine.announce_transactions(manager.id(), state, true, bundles),
			None => engine.announce_transactions(manager.id(), state, false, Vec::new()),
		}
	}
}

impl Outcome for Transfers {
	const REQUEST: &'static str = "GetTransfers";

	fn report(engine: &dyn SyncEngine, manager: &Owned<ManagerKind>, state: CallbackState, outcome: Option<Self>) {
		match outcome {
			Some(Transfers(bundles)) => engine.announce_transfers(manager.id(), state, true, bundles),
			None => engine.announce_transfers(manager.id(), state, false, Vec::new()),
		}
	}
}

impl Outcome for Submitted {
	const REQUEST: &'static str = "SubmitTransaction";

	fn report(engine: &dyn SyncEngine, manager: &Owned<ManagerKind>, state: CallbackState, outcome: Option<Self>) {
		match outcome {
			Some(submitted) => engine.announce_submit_transfer(
				manager.id(),
				state,
				Some(submitted.identifier),
				submitted.hash,
				true,
			),
			None => engine.announce_submit_transfer(manager.id(), state, None, None, false),
		}
	}
}

impl Outcome for FeeEstimated {
	const REQUEST: &'static str = "EstimateTransactionFee";

	fn report(engine: &dyn SyncEngine, manager: &Owned<ManagerKind>, state: CallbackState, outcome: Option<Self>) {
		match outcome {
			Some(fee) => engine.announce_estimate_fee(manager.id(), state, true, fee.cost_units, fee.properties),
			None => engine.announce_estimate_fee(manager.id(), state, false, 0, HashMap::new()),
		}
	}
}

/// Obligation to answer one data-fetch request.
pub struct Completion<T: Outcome> {
	manager: Owned<ManagerKind>,
	state: CallbackState,
	reported: bool,
	_outcome: PhantomData<fn(T)>,
}

impl<T: Outcome> Completion<T> {
	pub fn new(manager: Owned<ManagerKind>, state: CallbackState) -> Self {
		Self {
			manager,
			state,
			reported: false,
			_outcome: PhantomData,
		}
	}

	pub fn manager(&self) -> &Owned<ManagerKind> {
		&self.manager
	}

	pub fn succeed(mut self, outcome: T) {
		debug!("{}: succeeded", T::REQUEST);
		self.report(Some(outcome));
	}

	pub fn fail(mut self) {
		self.report(None);
	}

	fn report(&mut self, outcome: Option<T>) {
		self.reported = true;
		T::report(self.manager.engine().as_ref(), &self.manager, self.state, outcome);
	}
}

impl<T: Outcome> Drop for Completion<T> {
	fn drop(&mut self) {
		if !self.reported {
			warn!("{}: completing with failure", T::REQUEST);
			self.report(None);
		}
	}
}

fn block_bound(block_number: u64) -> Option<u64> {
	(block_number != BLOCK_HEIGHT_UNBOUND).then_some(block_number)
}

pub fn get_block_number(system: &System, manager: WalletManager, completion: Completion<BlockNumber>) {
	let blockchain_id = manager.network().uids();
	let query = system.query().clone();

	system.spawn_query(async move {
		match query.get_blockchain(&blockchain_id).await {
			Ok(blockchain) => match (blockchain.block_height, blockchain.verified_block_hash) {
				(Some(block_number), Some(verified_block_hash)) => completion.succeed(BlockNumber {
					block_number,
					verified_block_hash,
				}),
				_ => {
					error!("GetBlockNumber: failed with missing block height");
					completion.fail();
				}
			},
			Err(e) => {
				error!("GetBlockNumber: failed: {}", e);
				completion.fail();
			}
		}
	});
}

pub fn get_transactions(
	system: &System,
	manager: WalletManager,
	completion: Completion<Transactions>,
	addresses: Vec<String>,
	begin_block_number: u64,
	end_block_number: u64,
) {
	let network = manager.network();
	let request = TransactionQuery::transactions(
		network.uids(),
		canonical_addresses(addresses, network.network_type()),
		block_bound(begin_block_number),
		block_bound(end_block_number),
	);
	let query = system.query().clone();

	system.spawn_query(async move {
		match query.get_transactions(request).await {
			Ok(transactions) => {
				debug!("GetTransactions: received {} transactions", transactions.len());
				let bundles = transactions.iter().filter_map(make_transaction_bundle).collect();
				completion.succeed(Transactions(bundles));
			}
			Err(e) => {
				error!("GetTransactions: received an error, completing with failure: {}", e);
				completion.fail();
			}
		}
	});
}

pub fn get_transfers(
	system: &System,
	manager: WalletManager,
	completion: Completion<Transfers>,
	addresses: Vec<String>,
	begin_block_number: u64,
	end_block_number: u64,
) {
	let network = manager.network();
	let addresses = canonical_addresses(addresses, network.network_type());
	let request = TransactionQuery::transfers(
		network.uids(),
		addresses.clone(),
		block_bound(begin_block_number),
		block_bound(end_block_number),
	);
	let query = system.query().clone();

	system.spawn_query(async move {
		let transactions = match query.get_transactions(request).await {
			Ok(transactions) => transactions,
			Err(e) => {
				error!("GetTransfers: received an error, completing with failure: {}", e);
				completion.fail();
				return;
			}
		};

		let mut bundles = Vec::new();
		for transaction in &transactions {
			match make_transfer_bundles(transaction, &addresses) {
				Ok(mut merged) => bundles.append(&mut merged),
				Err(e @ ReconcileError::UnknownStatus { .. }) => {
					error!("GetTransfers: skipping transaction: {}", e);
				}
				Err(e) => {
					error!("GetTransfers: {}, completing with failure", e);
					completion.fail();
					return;
				}
			}
		}
		completion.succeed(Transfers(bundles));
	});
}

pub fn submit_transaction(
	system: &System,
	manager: WalletManager,
	completion: Completion<Submitted>,
	identifier: String,
	transaction: Vec<u8>,
) {
	if transaction.is_empty() {
		error!("SubmitTransaction: missing transaction bytes");
		completion.fail();
		return;
	}

	let blockchain_id = manager.network().uids();
	let query = system.query().clone();

	system.spawn_query(async move {
		match query
			.create_transaction(&blockchain_id, &transaction, &identifier)
			.await
		{
			Ok(TransactionIdentifier { identifier, hash, .. }) => {
				completion.succeed(Submitted { identifier, hash })
			}
			Err(e) => {
				error!("SubmitTransaction: failed: {}", e);
				completion.fail();
			}
		}
	});
}

pub fn estimate_transaction_fee(
	system: &System,
	manager: WalletManager,
	completion: Completion<FeeEstimated>,
	transaction: Vec<u8>,
) {
	if transaction.is_empty() {
		error!("EstimateTransactionFee: missing transaction bytes");
		completion.fail();
		return;
	}

	let blockchain_id = manager.network().uids();
	let query = system.query().clone();

	system.spawn_query(async move {
		match query.estimate_transaction_fee(&blockchain_id, &transaction).await {
			Ok(TransactionFee { cost_units, properties }) => {
				completion.succeed(FeeEstimated { cost_units, properties })
			}
			Err(e) => {
				error!("EstimateTransactionFee: failed: {}", e);
				completion.fail();
			}
		}
	});
}

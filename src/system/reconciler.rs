//! Reconciliation of data service transactions into engine bundles.
//!
//! The data service reports the fee of a transaction as a pseudo-transfer whose target is
//! [`FEE_TARGET`](crate::client::FEE_TARGET). The engine instead expects the fee attached to the value transfer that paid
//! it. [`merge_transfers`] folds the fee pseudo-transfer into the matching value transfer, and
//! synthesizes a zero-amount placeholder when the paying transfer is not among the wallet's
//! transfers (a pure fee payment such as a token approval).

use std::collections::HashMap;

use tracing::{debug, error};

use crate::client::{RawAmount, RawTransaction, RawTransfer};
use crate::engine::{BLOCK_HEIGHT_UNBOUND, NetworkType, TransactionBundle, TransferBundle, TransferStatus};
use crate::system::types::ReconcileError;

/// Target address given to a synthesized placeholder transfer.
pub const PLACEHOLDER_TARGET: &str = "unknown";

/// A transfer to announce, with the fee amount attached to it if it paid the fee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedTransfer {
	pub transfer: RawTransfer,
	pub fee: Option<String>,
}

/// Map a data service status string to the engine's transfer status.
///
/// `None` for unrecognized statuses; such records are rejected rather than announced.
pub fn transfer_status(status: &str) -> Option<TransferStatus> {
	match status {
		"confirmed" => Some(TransferStatus::Included),
		"submitted" | "reverted" => Some(TransferStatus::Submitted),
		"failed" | "rejected" => Some(TransferStatus::Errored),
		_ => None,
	}
}

/// Normalize addresses for networks whose addresses compare case-insensitively.
pub fn canonical_addresses(addresses: Vec<String>, network_type: NetworkType) -> Vec<String> {
	if network_type.has_case_insensitive_addresses() {
		addresses.into_iter().map(|address| address.to_lowercase()).collect()
	} else {
		addresses
	}
}

/// Merge the fee pseudo-transfer of `transaction` into the transfers relevant to `addresses`.
///
/// # Arguments
/// * `transaction` - Transaction with its embedded transfers.
/// * `addresses` - Canonical addresses owned by the requesting wallet manager.
///
/// # Returns
/// One entry per transfer to announce, in order, or `ReconcileError::MultipleFeeTransfers`
/// if more than one relevant transfer is a fee.
pub fn merge_transfers(
	transaction: &RawTransaction,
	addresses: &[String],
) -> Result<Vec<MergedTransfer>, ReconcileError> {
	let owned = |address: &Option<String>| {
		address
			.as_ref()
			.is_some_and(|address| addresses.contains(address))
	};

	let transfers: Vec<&RawTransfer> = transaction
		.transfers
		.iter()
		.filter(|transfer| owned(&transfer.source) || owned(&transfer.target))
		.collect();

	let (fees, values): (Vec<&RawTransfer>, Vec<&RawTransfer>) =
		transfers.iter().copied().partition(|transfer| transfer.is_fee());

	let fee_transfer = match fees.as_slice() {
		[] => {
			return Ok(transfers
				.into_iter()
				.map(|transfer| MergedTransfer {
					transfer: transfer.clone(),
					fee: None,
				})
				.collect());
		}
		[fee_transfer] => *fee_transfer,
		_ => {
			return Err(ReconcileError::MultipleFeeTransfers {
				transaction_id: transaction.id.clone(),
				count: fees.len(),
			});
		}
	};

	let paid_by = |transfer: &&&RawTransfer| {
		transfer.transaction_id == fee_transfer.transaction_id && transfer.source == fee_transfer.source
	};
	let matched = values
		.iter()
		.filter(paid_by)
		.find(|transfer| transfer.amount.currency == fee_transfer.amount.currency)
		.or_else(|| values.iter().find(paid_by))
		.copied();

	let mut merged: Vec<RawTransfer> = values.iter().map(|transfer| (*transfer).clone()).collect();
	if matched.is_none() {
		debug!(
			transaction_id = %transaction.id,
			"No transfer paid fee {}, adding placeholder", fee_transfer.id
		);
		merged.push(placeholder_for(fee_transfer));
	}

	// The placeholder carries the fee transfer's id, so it receives the fee when nothing matched.
	let fee_target_id = matched.map_or(&fee_transfer.id, |transfer| &transfer.id).clone();

	Ok(merged
		.into_iter()
		.map(|transfer| {
			let fee = (transfer.id == fee_target_id).then(|| fee_transfer.amount.amount.clone());
			MergedTransfer { transfer, fee }
		})
		.collect())
}

fn placeholder_for(fee_transfer: &RawTransfer) -> RawTransfer {
	RawTransfer {
		id: fee_transfer.id.clone(),
		blockchain_id: fee_transfer.blockchain_id.clone(),
		source: fee_transfer.source.clone(),
		target: Some(PLACEHOLDER_TARGET.to_string()),
		amount: RawAmount {
			currency: fee_transfer.amount.currency.clone(),
			amount: "0".to_string(),
		},
		index: fee_transfer.index,
		transaction_id: Some(
			fee_transfer
				.transaction_id
				.clone()
				.unwrap_or_else(|| "0".to_string()),
		),
		acknowledgements: fee_transfer.acknowledgements,
		meta: fee_transfer.meta.clone(),
	}
}

fn unix_timestamp(transaction: &RawTransaction) -> u64 {
	transaction
		.timestamp
		.and_then(|timestamp| u64::try_from(timestamp.timestamp()).ok())
		.unwrap_or(0)
}

fn known_status(transaction: &RawTransaction) -> Result<TransferStatus, ReconcileError> {
	transfer_status(&transaction.status).ok_or_else(|| ReconcileError::UnknownStatus {
		transaction_id: transaction.id.clone(),
		status: transaction.status.clone(),
	})
}

/// Build the transaction bundle for a transaction-history response.
///
/// `None` if the transaction has no serialized bytes or an unrecognized status.
pub fn make_transaction_bundle(transaction: &RawTransaction) -> Option<TransactionBundle> {
	let Some(raw) = transaction.raw.clone() else {
		error!(transaction_id = %transaction.id, "Transaction is missing raw bytes");
		return None;
	};

	let status = match known_status(transaction) {
		Ok(status) => status,
		Err(e) => {
			error!("{}", e);
			return None;
		}
	};

	debug!(transaction_id = %transaction.id, "Announcing transaction");
	Some(TransactionBundle {
		status,
		raw,
		timestamp: unix_timestamp(transaction),
		block_height: transaction.block_height.unwrap_or(BLOCK_HEIGHT_UNBOUND),
	})
}

/// Build the transfer bundles for a transfer-history response.
///
/// # Arguments
/// * `transaction` - Transaction with its embedded transfers.
/// * `addresses` - Canonical addresses owned by the requesting wallet manager.
///
/// # Returns
/// One bundle per merged transfer. Transfer metadata overrides transaction metadata on key
/// collisions.
pub fn make_transfer_bundles(
	transaction: &RawTransaction,
	addresses: &[String],
) -> Result<Vec<TransferBundle>, ReconcileError> {
	let status = known_status(transaction)?;
	let block_timestamp = unix_timestamp(transaction);
	let block_number = transaction.block_height.unwrap_or(BLOCK_HEIGHT_UNBOUND);

	let bundles = merge_transfers(transaction, addresses)?
		.into_iter()
		.map(|MergedTransfer { transfer, fee }| {
			debug!(transaction_id = %transaction.id, "Announcing transfer {}", transfer.id);

			let mut meta: HashMap<String, String> = transaction.meta.clone();
			meta.extend(transfer.meta);

			TransferBundle {
				status,
				hash: transaction.hash.clone(),
				identifier: transaction.identifier.clone(),
				uids: transfer.id,
				source: transfer.source,
				target: transfer.target,
				amount: transfer.amount.amount,
				currency: transfer.amount.currency,
				fee,
				transfer_index: transfer.index,
				block_timestamp,
				block_number,
				block_confirmations: transaction.confirmations.unwrap_or(0),
				block_transaction_index: transaction.index.unwrap_or(0),
				block_hash: transaction.hash.clone(),
				meta,
			}
		})
		.collect();

	Ok(bundles)
}

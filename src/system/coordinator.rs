//! Correlation of asynchronous engine operations with the application calls that started them.
//!
//! A fee estimation is started with an [`OperationCookie`]; the engine later reports the outcome
//! in a wallet event carrying the same cookie. The coordinator hands the outcome to whoever is
//! awaiting that cookie.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::engine::{EstimateStatus, FeeBasis, OperationCookie};
use crate::system::types::FeeEstimationError;

pub type FeeEstimate = Result<FeeBasis, FeeEstimationError>;

#[derive(Default)]
pub struct CallbackCoordinator {
	next_cookie: AtomicU64,
	pending: Mutex<HashMap<OperationCookie, oneshot::Sender<FeeEstimate>>>,
}

impl CallbackCoordinator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a pending fee estimation.
	///
	/// # Returns
	/// The cookie to pass to the engine, and a receiver resolved when the engine reports back.
	pub fn register(&self) -> (OperationCookie, oneshot::Receiver<FeeEstimate>) {
		let cookie = OperationCookie(self.next_cookie.fetch_add(1, Ordering::Relaxed) + 1);
		let (sender, receiver) = oneshot::channel();
		self.pending
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(cookie, sender);
		(cookie, receiver)
	}

	fn take(&self, cookie: OperationCookie) -> Option<oneshot::Sender<FeeEstimate>> {
		let sender = self
			.pending
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.remove(&cookie);
		if sender.is_none() {
			warn!("No pending operation for cookie {:?}", cookie);
		}
		sender
	}

	pub fn complete_with_success(&self, cookie: OperationCookie, basis: FeeBasis) {
		if let Some(sender) = self.take(cookie) {
			if sender.send(Ok(basis)).is_err() {
				debug!("Fee estimate for {:?} no longer awaited", cookie);
			}
		}
	}

	pub fn complete_with_error(&self, cookie: OperationCookie, error: FeeEstimationError) {
		if let Some(sender) = self.take(cookie) {
			if sender.send(Err(error)).is_err() {
				debug!("Fee estimate for {:?} no longer awaited", cookie);
			}
		}
	}

	/// Route an engine fee-estimation report.
	pub fn handle_fee_estimated(&self, status: EstimateStatus, cookie: OperationCookie, basis: Option<FeeBasis>) {
		match (status, basis) {
			(EstimateStatus::Success, Some(basis)) => self.complete_with_success(cookie, basis),
			(EstimateStatus::Success, None) => {
				warn!("Fee estimate {:?} succeeded without a fee basis", cookie);
				self.complete_with_error(cookie, FeeEstimationError::ServiceError);
			}
			(EstimateStatus::InsufficientFunds, _) => {
				self.complete_with_error(cookie, FeeEstimationError::InsufficientFunds)
			}
			(EstimateStatus::ServiceUnavailable, _) => {
				self.complete_with_error(cookie, FeeEstimationError::ServiceUnavailable)
			}
			(EstimateStatus::ServiceError, _) => {
				self.complete_with_error(cookie, FeeEstimationError::ServiceError)
			}
		}
	}

	/// Fail every pending operation, e.g. when the session is torn down.
	pub fn cancel_all(&self) {
		let pending: Vec<_> = self
			.pending
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.drain()
			.collect();
		for (_, sender) in pending {
			let _ = sender.send(Err(FeeEstimationError::Cancelled));
		}
	}

	pub fn pending_count(&self) -> usize {
		self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
	}
}

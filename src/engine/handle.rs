//! Owned references to engine-side entities.
//!
//! The engine hands out references to its entities (systems, networks, wallet managers, wallets
//! and transfers) as opaque identifiers together with an ownership grant. An [`Owned`] value
//! carries exactly one such grant and gives it back when dropped, so every exit path of a
//! callback (normal return, early return after a resolution miss, or unwinding) releases the
//! reference exactly once. Keeping an entity past the callback requires [`Owned::retain`].

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::SyncEngine;

/// Opaque identifier of an engine-side entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Marker for the kind of entity a handle refers to.
pub trait HandleKind: Send + Sync + 'static {
	const NAME: &'static str;
}

/// The engine instance owned by one session.
pub enum SystemKind {}
/// A blockchain network known to a system.
pub enum NetworkKind {}
/// A wallet manager, one per network in use.
pub enum ManagerKind {}
/// A wallet held by a wallet manager.
pub enum WalletKind {}
/// A transfer held by a wallet.
pub enum TransferKind {}

impl HandleKind for SystemKind {
	const NAME: &'static str = "system";
}
impl HandleKind for NetworkKind {
	const NAME: &'static str = "network";
}
impl HandleKind for ManagerKind {
	const NAME: &'static str = "wallet manager";
}
impl HandleKind for WalletKind {
	const NAME: &'static str = "wallet";
}
impl HandleKind for TransferKind {
	const NAME: &'static str = "transfer";
}

/// A single ownership grant on an engine entity, released on drop.
pub struct Owned<K: HandleKind> {
	id: HandleId,
	engine: Arc<dyn SyncEngine>,
	_kind: PhantomData<fn() -> K>,
}

impl<K: HandleKind> Owned<K> {
	/// Take over a grant the engine already issued to the caller.
	///
	/// No retain is performed; the returned value releases the grant when dropped.
	pub fn adopt(engine: Arc<dyn SyncEngine>, id: HandleId) -> Self {
		Self {
			id,
			engine,
			_kind: PhantomData,
		}
	}

	/// Acquire an additional grant on the same entity.
	pub fn retain(&self) -> Self {
		self.engine.retain(self.id);
		Self::adopt(self.engine.clone(), self.id)
	}

	pub fn id(&self) -> HandleId {
		self.id
	}

	pub fn engine(&self) -> &Arc<dyn SyncEngine> {
		&self.engine
	}
}

impl<K: HandleKind> Drop for Owned<K> {
	fn drop(&mut self) {
		self.engine.release(self.id);
	}
}

impl<K: HandleKind> PartialEq for Owned<K> {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl<K: HandleKind> Eq for Owned<K> {}

impl<K: HandleKind> fmt::Debug for Owned<K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Owned<{}>({})", K::NAME, self.id)
	}
}

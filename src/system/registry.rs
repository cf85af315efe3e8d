//! Process-wide table of live sessions.
//!
//! The engine only ever hands back a [`SessionToken`]; the registry maps it to the owning
//! session. Both pumps and the application thread touch the table concurrently, so all access
//! goes through a lock. A token leaves the active table at the very start of teardown, which
//! bars every later callback for it. What happens to the torn-down session afterwards is
//! decided by the [`RetentionPolicy`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info};

use crate::config::RetentionPolicy;
use crate::engine::SessionToken;
use crate::system::types::RegistryError;

pub struct SessionRegistry<S> {
	next_token: AtomicU32,
	active: RwLock<HashMap<SessionToken, Arc<S>>>,
	/// Sessions kept alive after teardown under `RetentionPolicy::RetainForever`.
	retired: Mutex<Vec<Arc<S>>>,
	retention: RetentionPolicy,
}

impl<S> SessionRegistry<S> {
	pub fn new(retention: RetentionPolicy) -> Self {
		Self {
			next_token: AtomicU32::new(0),
			active: RwLock::new(HashMap::new()),
			retired: Mutex::new(Vec::new()),
			retention,
		}
	}

	/// Allocate a token not held by any active session.
	pub fn allocate_token(&self) -> SessionToken {
		loop {
			let candidate = SessionToken(self.next_token.fetch_add(1, Ordering::Relaxed).wrapping_add(1));
			if !self.is_active(candidate) {
				return candidate;
			}
		}
	}

	pub fn register(&self, token: SessionToken, session: Arc<S>) -> Result<(), RegistryError> {
		let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
		if active.contains_key(&token) {
			return Err(RegistryError::TokenInUse(token));
		}
		active.insert(token, session);
		info!(token = %token, "Registered session");
		Ok(())
	}

	pub fn lookup(&self, token: SessionToken) -> Option<Arc<S>> {
		self.active
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(&token)
			.cloned()
	}

	/// Remove the active mapping; every later lookup of `token` misses.
	pub fn unregister(&self, token: SessionToken) -> Option<Arc<S>> {
		let removed = self
			.active
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.remove(&token);
		if removed.is_some() {
			info!(token = %token, "Unregistered session");
		}
		removed
	}

	/// Hand a torn-down session to the retention policy.
	pub fn retire(&self, session: Arc<S>) {
		match self.retention {
			RetentionPolicy::RetainForever => {
				self.retired
					.lock()
					.unwrap_or_else(PoisonError::into_inner)
					.push(session);
			}
			RetentionPolicy::Release => {
				debug!("Releasing retired session");
				drop(session);
			}
		}
	}

	pub fn is_active(&self, token: SessionToken) -> bool {
		self.active
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.contains_key(&token)
	}

	pub fn active_count(&self) -> usize {
		self.active.read().unwrap_or_else(PoisonError::into_inner).len()
	}

	pub fn retired_count(&self) -> usize {
		self.retired.lock().unwrap_or_else(PoisonError::into_inner).len()
	}

	pub fn retention(&self) -> RetentionPolicy {
		self.retention
	}
}

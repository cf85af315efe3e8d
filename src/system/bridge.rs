//! Creation and teardown of sessions.
//!
//! The [`Bridge`] owns the session registry and the dispatcher the engine calls back into. It is
//! created once per process; sessions are created and destroyed through it.

use std::sync::Arc;

use tracing::{info, warn};

use crate::client::DataService;
use crate::config::BridgeConfig;
use crate::engine::{AccountInfo, Owned, SyncEngine, SystemSpec};
use crate::system::dispatcher::EventDispatcher;
use crate::system::events::SystemListener;
use crate::system::pump::Pump;
use crate::system::registry::SessionRegistry;
use crate::system::session::System;
use crate::system::storage;
use crate::system::types::{StorageError, SystemError};

pub struct Bridge {
	engine: Arc<dyn SyncEngine>,
	dispatcher: Arc<EventDispatcher>,
	config: BridgeConfig,
}

impl Bridge {
	/// Create the bridge and start its pumps on the current tokio runtime.
	pub fn new(engine: Arc<dyn SyncEngine>, config: BridgeConfig) -> Self {
		let registry = Arc::new(SessionRegistry::new(config.retention));
		Self {
			engine,
			dispatcher: Arc::new(EventDispatcher::new(registry)),
			config,
		}
	}

	pub fn config(&self) -> &BridgeConfig {
		&self.config
	}

	pub fn registry(&self) -> &Arc<SessionRegistry<System>> {
		self.dispatcher.registry()
	}

	/// Wait until every engine callback received so far has been dispatched.
	pub async fn flush(&self) {
		self.dispatcher.flush().await;
	}

	/// Create and start a session for `account`.
	///
	/// # Arguments
	/// * `account` - Account to synchronize; its identifier names the storage directory.
	/// * `listener` - Receives the session's events.
	/// * `delivery` - Queue on which `listener` is called.
	/// * `query` - Data service answering the engine's requests.
	///
	/// # Returns
	/// The registered session, or a `SystemError` if storage, the registry or the engine refuse.
	pub fn create_system(
		&self,
		account: AccountInfo,
		listener: Arc<dyn SystemListener>,
		delivery: Pump,
		query: Arc<dyn DataService>,
	) -> Result<Arc<System>, SystemError> {
		let storage_path = storage::storage_path(&self.config.storage_root, &account.filesystem_identifier);
		storage::ensure_path(&storage_path)?;

		let registry = self.registry();
		let token = registry.allocate_token();
		let spec = SystemSpec {
			storage_path: storage_path.clone(),
			is_mainnet: self.config.is_mainnet,
			account: account.clone(),
		};

		let core = self
			.engine
			.create_system(token, &spec, self.dispatcher.clone(), self.dispatcher.clone())
			.ok_or(SystemError::EngineRefused(token))?;
		let core = Owned::adopt(self.engine.clone(), core);

		let system = Arc::new(System::new(
			token,
			core,
			account,
			storage_path,
			self.config.is_mainnet,
			listener,
			delivery,
			query,
		));
		registry.register(token, system.clone())?;
		system.start();

		info!(token = %token, "Created system at {}", system.storage_path().display());
		Ok(system)
	}

	/// Tear down a session.
	///
	/// The session leaves the registry first, so callbacks still in flight for it are dropped.
	/// Its wallet managers are then disconnected and stopped, its queries cancelled, and the
	/// session handed to the retention policy.
	pub fn destroy(&self, system: &System) {
		let token = system.token();
		let Some(system) = self.registry().unregister(token) else {
			warn!(token = %token, "System already destroyed");
			return;
		};

		system.pause();
		system.stop_all();
		system.coordinator().cancel_all();

		info!(token = %token, "Destroyed system");
		self.registry().retire(system);
	}

	/// Destroy a session and delete its storage directory.
	pub fn wipe(&self, system: &System) {
		let storage_path = system.storage_path().to_path_buf();
		self.destroy(system);
		storage::delete_recursively(&storage_path);
	}

	/// Delete every storage directory under the storage root except those of `exempt`.
	pub fn wipe_all(&self, exempt: &[Arc<System>]) -> Result<(), StorageError> {
		storage::wipe_all(
			&self.config.storage_root,
			exempt.iter().map(|system| system.storage_path()),
		)
	}
}

//! Configuration for the bridge and its data service client.

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::{BoolishValueParser, FalseyValueParser};
use clap::{ArgAction, Parser};

/// What happens to a session after it is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
	/// Keep destroyed sessions referenced for the life of the process. The engine is not safe
	/// against a system being released while late callbacks are still in flight.
	#[default]
	RetainForever,
	/// Drop the last reference as soon as teardown completes.
	Release,
}

/// Configuration for the blockchain data service client.
#[derive(Debug, Clone)]
pub struct DataServiceConfig {
	pub base_url: String,
	pub timeout: Duration,
	pub max_page_size: u32,
}

impl Default for DataServiceConfig {
	fn default() -> Self {
		Self {
			base_url: "https://api.blockset.com".to_string(),
			timeout: Duration::from_secs(30),
			max_page_size: 20,
		}
	}
}

/// Top-level bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
	/// Directory holding one storage directory per account.
	pub storage_root: PathBuf,
	pub is_mainnet: bool,
	pub retention: RetentionPolicy,
	pub data_service: DataServiceConfig,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			storage_root: PathBuf::from("wallet-sync-data"),
			is_mainnet: false,
			retention: RetentionPolicy::default(),
			data_service: DataServiceConfig::default(),
		}
	}
}

/// Command-line arguments, each falling back to a `WALLET_SYNC_*` environment variable.
#[derive(Debug, Parser)]
#[command(name = "wallet-sync-bridge")]
#[command(about = "Wallet sync bridge maintenance and data service check", long_about = None)]
pub struct BridgeArgs {
	/// Directory holding one storage directory per account
	#[arg(long, env = "WALLET_SYNC_STORAGE_ROOT", default_value = "wallet-sync-data")]
	pub storage_root: PathBuf,

	/// Use mainnet blockchains
	#[arg(long, env = "WALLET_SYNC_MAINNET", value_parser = FalseyValueParser::new())]
	pub mainnet: bool,

	/// Base URL of the blockchain data service
	#[arg(long, env = "WALLET_SYNC_DATA_URL", default_value = "https://api.blockset.com")]
	pub data_url: String,

	/// Keep destroyed sessions referenced for the life of the process
	#[arg(
		long,
		env = "WALLET_SYNC_RETAIN_RETIRED",
		default_value_t = true,
		action = ArgAction::Set,
		value_parser = BoolishValueParser::new()
	)]
	pub retain_retired: bool,

	/// Delete every account's storage under the storage root, then exit
	#[arg(long)]
	pub wipe_all: bool,
}

impl From<&BridgeArgs> for BridgeConfig {
	fn from(args: &BridgeArgs) -> Self {
		Self {
			storage_root: args.storage_root.clone(),
			is_mainnet: args.mainnet,
			retention: if args.retain_retired {
				RetentionPolicy::RetainForever
			} else {
				RetentionPolicy::Release
			},
			data_service: DataServiceConfig {
				base_url: args.data_url.clone(),
				..DataServiceConfig::default()
			},
		}
	}
}

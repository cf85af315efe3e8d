use clap::Parser;
use tracing::{error, info, warn};

use wallet_sync_bridge::client::{BlocksetClient, DataService};
use wallet_sync_bridge::config::{BridgeArgs, BridgeConfig};
use wallet_sync_bridge::system::storage;

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	let args = BridgeArgs::parse();
	let config = BridgeConfig::from(&args);
	info!(
		"Starting wallet sync bridge (storage {}, mainnet {})",
		config.storage_root.display(),
		config.is_mainnet
	);

	if args.wipe_all {
		match storage::wipe_all(&config.storage_root, std::iter::empty()) {
			Ok(()) => info!("Wiped every account under {}", config.storage_root.display()),
			Err(e) => error!("Failed to wipe storage: {}", e),
		}
		return;
	}

	let client = match BlocksetClient::new(&config.data_service) {
		Ok(client) => client,
		Err(e) => {
			error!("Failed to create data service client: {}", e);
			return;
		}
	};

	let (blockchains, currencies) = futures::join!(
		client.get_blockchains(config.is_mainnet),
		client.get_currencies(None, config.is_mainnet)
	);

	match blockchains {
		Ok(blockchains) => {
			for blockchain in blockchains {
				info!(
					"{}: height {:?}, {} fee tiers",
					blockchain.id,
					blockchain.block_height,
					blockchain.fee_estimates.len()
				);
			}
		}
		Err(e) => error!("Failed to fetch blockchains: {}", e),
	}

	match currencies {
		Ok(currencies) => info!("Data service lists {} verified currencies", currencies.len()),
		Err(e) => warn!("Failed to fetch currencies: {}", e),
	}
}

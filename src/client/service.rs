use super::types::*;

/// Parameters of a transaction/transfer history query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
	pub blockchain_id: String,
	pub addresses: Vec<String>,
	/// Inclusive lower bound, `None` for unbounded.
	pub begin_block_number: Option<u64>,
	/// Exclusive upper bound, `None` for unbounded.
	pub end_block_number: Option<u64>,
	pub include_raw: bool,
	pub include_proof: bool,
	pub include_transfers: bool,
	pub max_page_size: Option<u32>,
}

impl TransactionQuery {
	/// Query returning serialized transactions without their transfers.
	pub fn transactions(
		blockchain_id: String,
		addresses: Vec<String>,
		begin_block_number: Option<u64>,
		end_block_number: Option<u64>,
	) -> Self {
		Self {
			blockchain_id,
			addresses,
			begin_block_number,
			end_block_number,
			include_raw: true,
			include_proof: false,
			include_transfers: false,
			max_page_size: None,
		}
	}

	/// Query returning transfers without serialized transactions.
	pub fn transfers(
		blockchain_id: String,
		addresses: Vec<String>,
		begin_block_number: Option<u64>,
		end_block_number: Option<u64>,
	) -> Self {
		Self {
			include_raw: false,
			include_transfers: true,
			..Self::transactions(blockchain_id, addresses, begin_block_number, end_block_number)
		}
	}
}

/// Asynchronous queries against the external blockchain data service.
#[async_trait::async_trait]
pub trait DataService: Send + Sync {
	async fn get_blockchains(&self, is_mainnet: bool) -> Result<Vec<Blockchain>, QueryError>;

	async fn get_blockchain(&self, blockchain_id: &str) -> Result<Blockchain, QueryError>;

	async fn get_currencies(
		&self,
		blockchain_id: Option<&str>,
		is_mainnet: bool,
	) -> Result<Vec<Currency>, QueryError>;

	async fn get_transactions(&self, query: TransactionQuery) -> Result<Vec<RawTransaction>, QueryError>;

	async fn create_transaction(
		&self,
		blockchain_id: &str,
		transaction: &[u8],
		identifier: &str,
	) -> Result<TransactionIdentifier, QueryError>;

	async fn estimate_transaction_fee(
		&self,
		blockchain_id: &str,
		transaction: &[u8],
	) -> Result<TransactionFee, QueryError>;

	async fn get_hedera_account(
		&self,
		blockchain_id: &str,
		public_key: &str,
	) -> Result<Vec<HederaAccount>, QueryError>;

	async fn create_hedera_account(
		&self,
		blockchain_id: &str,
		public_key: &str,
	) -> Result<Vec<HederaAccount>, QueryError>;

	/// Fail every query currently in flight with [`QueryError::Cancelled`].
	fn cancel_all(&self);
}

//! HTTP client for a Blockset-style blockchain data service.
//!
//! This module provides an async client for the REST API that serves blockchains, currencies,
//! transaction history, transaction submission and fee estimation. List endpoints return their
//! items under `_embedded` and link to further pages through `_links.next`, which the client
//! follows until exhausted. All in-flight requests can be cancelled at once.

use super::service::{DataService, TransactionQuery};
use super::types::*;
use crate::config::DataServiceConfig;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Maximum number of addresses sent in a single history request.
const ADDRESS_CHUNK_SIZE: usize = 50;

/// Blockset data service client
#[derive(Clone)]
pub struct BlocksetClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// Base URL of the REST API, without trailing slash.
	base_url: String,
	/// Page size requested from list endpoints.
	max_page_size: u32,
	/// Bumped to cancel every request in flight.
	cancel: Arc<watch::Sender<u64>>,
}

impl BlocksetClient {
	/// Create a new data service client.
	///
	/// # Arguments
	/// * `config` - Endpoint, timeout and paging settings.
	///
	/// # Returns
	/// A new `BlocksetClient`, or a `QueryError` if the HTTP client cannot be built.
	pub fn new(config: &DataServiceConfig) -> Result<Self, QueryError> {
		let http_client = Client::builder().timeout(config.timeout).build()?;
		let (cancel, _) = watch::channel(0u64);

		info!("Created data service client for {}", config.base_url);
		Ok(Self {
			http_client,
			base_url: config.base_url.trim_end_matches('/').to_string(),
			max_page_size: config.max_page_size,
			cancel: Arc::new(cancel),
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	/// Send a request, racing it against cancellation.
	async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, QueryError> {
		let mut cancelled = self.cancel.subscribe();
		tokio::select! {
			result = Self::send(request) => result,
			_ = cancelled.changed() => {
				debug!("Request cancelled");
				Err(QueryError::Cancelled)
			}
		}
	}

	async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, QueryError> {
		let response = request.header("Accept", "application/json").send().await?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(QueryError::Status {
				code: status.as_u16(),
				message,
			});
		}

		Ok(response.json().await?)
	}

	/// Fetch every page of a list endpoint, collecting the items embedded under `key`.
	async fn get_all<T: DeserializeOwned>(
		&self,
		first: RequestBuilder,
		key: &str,
	) -> Result<Vec<T>, QueryError> {
		let mut items = Vec::new();
		let mut request = Some(first);

		while let Some(current) = request.take() {
			let page: serde_json::Value = self.execute(current).await?;

			if let Some(embedded) = page.get("_embedded").and_then(|e| e.get(key)) {
				let mut batch: Vec<T> = serde_json::from_value(embedded.clone())?;
				items.append(&mut batch);
			}

			request = page
				.get("_links")
				.and_then(|links| links.get("next"))
				.and_then(|next| next.get("href"))
				.and_then(|href| href.as_str())
				.map(|href| self.http_client.get(href));
		}

		Ok(items)
	}
}

#[async_trait::async_trait]
impl DataService for BlocksetClient {
	async fn get_blockchains(&self, is_mainnet: bool) -> Result<Vec<Blockchain>, QueryError> {
		let request = self
			.http_client
			.get(self.url("/blockchains"))
			.query(&[("testnet", (!is_mainnet).to_string())]);
		self.get_all(request, "blockchains").await
	}

	async fn get_blockchain(&self, blockchain_id: &str) -> Result<Blockchain, QueryError> {
		let request = self
			.http_client
			.get(self.url(&format!("/blockchains/{}", blockchain_id)));
		self.execute(request).await
	}

	async fn get_currencies(
		&self,
		blockchain_id: Option<&str>,
		is_mainnet: bool,
	) -> Result<Vec<Currency>, QueryError> {
		let mut params = vec![
			("testnet", (!is_mainnet).to_string()),
			("verified", "true".to_string()),
		];
		if let Some(id) = blockchain_id {
			params.push(("blockchain_id", id.to_string()));
		}

		let request = self.http_client.get(self.url("/currencies")).query(&params);
		self.get_all(request, "currencies").await
	}

	async fn get_transactions(&self, query: TransactionQuery) -> Result<Vec<RawTransaction>, QueryError> {
		debug!(
			"Querying transactions on {} for {} addresses ({:?} -> {:?})",
			query.blockchain_id,
			query.addresses.len(),
			query.begin_block_number,
			query.end_block_number
		);

		let mut transactions = Vec::new();
		for chunk in query.addresses.chunks(ADDRESS_CHUNK_SIZE) {
			let mut params: Vec<(&str, String)> = vec![
				("blockchain_id", query.blockchain_id.clone()),
				("include_proof", query.include_proof.to_string()),
				("include_raw", query.include_raw.to_string()),
				("include_transfers", query.include_transfers.to_string()),
				(
					"max_page_size",
					query.max_page_size.unwrap_or(self.max_page_size).to_string(),
				),
			];
			if let Some(begin) = query.begin_block_number {
				params.push(("start_height", begin.to_string()));
			}
			if let Some(end) = query.end_block_number {
				params.push(("end_height", end.to_string()));
			}
			params.extend(chunk.iter().map(|address| ("address", address.clone())));

			let request = self.http_client.get(self.url("/transactions")).query(&params);
			let mut batch: Vec<RawTransaction> = self.get_all(request, "transactions").await?;
			transactions.append(&mut batch);
		}

		Ok(transactions)
	}

	async fn create_transaction(
		&self,
		blockchain_id: &str,
		transaction: &[u8],
		identifier: &str,
	) -> Result<TransactionIdentifier, QueryError> {
		let body = json!({
			"blockchain_id": blockchain_id,
			"transaction_id": identifier,
			"data": STANDARD.encode(transaction),
		});

		let request = self.http_client.post(self.url("/transactions")).json(&body);
		self.execute(request).await
	}

	async fn estimate_transaction_fee(
		&self,
		blockchain_id: &str,
		transaction: &[u8],
	) -> Result<TransactionFee, QueryError> {
		let body = json!({
			"blockchain_id": blockchain_id,
			"transaction_id": "",
			"data": STANDARD.encode(transaction),
		});

		let request = self
			.http_client
			.post(self.url("/transactions"))
			.query(&[("estimate_fee", "true")])
			.json(&body);
		self.execute(request).await
	}

	async fn get_hedera_account(
		&self,
		blockchain_id: &str,
		public_key: &str,
	) -> Result<Vec<HederaAccount>, QueryError> {
		let request = self
			.http_client
			.get(self.url("/_experimental/hedera/accounts"))
			.query(&[("blockchain_id", blockchain_id), ("pub_key", public_key)]);
		self.get_all(request, "accounts").await
	}

	async fn create_hedera_account(
		&self,
		blockchain_id: &str,
		public_key: &str,
	) -> Result<Vec<HederaAccount>, QueryError> {
		let body = json!({
			"blockchain_id": blockchain_id,
			"pub_key": public_key,
		});

		let request = self
			.http_client
			.post(self.url("/_experimental/hedera/accounts"))
			.json(&body);
		let page: serde_json::Value = self.execute(request).await?;
		embedded_accounts(&page)
	}

	fn cancel_all(&self) {
		self.cancel.send_modify(|epoch| *epoch += 1);
		debug!("Cancelled all in-flight queries");
	}
}

/// Accounts embedded in a Hedera account creation response.
fn embedded_accounts(page: &serde_json::Value) -> Result<Vec<HederaAccount>, QueryError> {
	match page.get("_embedded").and_then(|e| e.get("accounts")) {
		Some(accounts) => Ok(serde_json::from_value(accounts.clone())?),
		None => {
			warn!("Hedera account creation returned no accounts");
			Err(QueryError::BadResponse("missing _embedded.accounts".to_string()))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_base_url_is_normalized() {
		let config = DataServiceConfig {
			base_url: "https://api.example.com/".to_string(),
			..DataServiceConfig::default()
		};
		let client = BlocksetClient::new(&config).expect("client builds");
		assert_eq!(client.url("/blockchains"), "https://api.example.com/blockchains");
	}

	#[test]
	fn test_account_creation_without_accounts_is_bad_response() {
		let page = json!({ "_links": {} });
		assert!(matches!(embedded_accounts(&page), Err(QueryError::BadResponse(_))));

		let page = json!({
			"_embedded": { "accounts": [{ "account_id": "0.0.42", "hbar_balance": 10 }] }
		});
		let accounts = embedded_accounts(&page).expect("accounts");
		assert_eq!(accounts.len(), 1);
		assert_eq!(accounts[0].id, "0.0.42");
	}
}

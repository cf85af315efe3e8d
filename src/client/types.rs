//! Types for the blockchain data service

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Target address the data service uses to mark a transfer as a fee payment.
pub const FEE_TARGET: &str = "__fee__";

/// An amount as reported by the data service: base-unit string plus currency identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawAmount {
    #[serde(rename = "currency_id")]
    pub currency: String,
    pub amount: String,
}

/// A single value movement inside a transaction.
///
/// A transfer whose `target` is [`FEE_TARGET`] represents the fee paid by `source` rather than
/// a transfer of value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawTransfer {
    #[serde(rename = "transfer_id")]
    pub id: String,
    pub blockchain_id: String,
    #[serde(rename = "from_address", default)]
    pub source: Option<String>,
    #[serde(rename = "to_address", default)]
    pub target: Option<String>,
    pub amount: RawAmount,
    pub index: u64,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub acknowledgements: Option<u64>,
    #[serde(default)]
    pub meta: HashMap<String, String>,
}

impl RawTransfer {
    /// Check if this transfer records a fee payment
    pub fn is_fee(&self) -> bool {
        self.target.as_deref() == Some(FEE_TARGET)
    }
}

/// Transaction data from the data service, with its embedded transfers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawTransaction {
    #[serde(rename = "transaction_id")]
    pub id: String,
    pub identifier: String,
    pub hash: String,
    pub blockchain_id: String,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confirmations: Option<u64>,
    #[serde(default)]
    pub index: Option<u64>,
    /// Status string such as `confirmed`, `submitted` or `failed`.
    pub status: String,
    /// Serialized transaction, base64 on the wire.
    #[serde(default, with = "base64_bytes")]
    pub raw: Option<Vec<u8>>,
    #[serde(default)]
    pub meta: HashMap<String, String>,
    #[serde(default)]
    pub transfers: Vec<RawTransfer>,
}

/// A fee tier advertised for a blockchain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockchainFee {
    pub fee: RawAmount,
    pub tier: String,
    /// Expected confirmation time in milliseconds.
    #[serde(rename = "estimated_confirmation_in")]
    pub confirmation_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Blockchain {
    pub id: String,
    pub name: String,
    pub network: String,
    pub is_mainnet: bool,
    pub native_currency_id: String,
    #[serde(default)]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub verified_block_hash: Option<String>,
    #[serde(default)]
    pub fee_estimates: Vec<BlockchainFee>,
    #[serde(default)]
    pub confirmations_until_final: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrencyDenomination {
    pub name: String,
    #[serde(rename = "short_name")]
    pub code: String,
    pub decimals: u8,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Currency {
    #[serde(rename = "currency_id")]
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub blockchain_id: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub denominations: Vec<CurrencyDenomination>,
}

/// Identifier assigned to a submitted transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionIdentifier {
    #[serde(rename = "transaction_id")]
    pub id: String,
    pub identifier: String,
    #[serde(default)]
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionFee {
    pub cost_units: u64,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HederaAccount {
    #[serde(rename = "account_id")]
    pub id: String,
    #[serde(rename = "hbar_balance", default)]
    pub balance: Option<u64>,
    #[serde(default)]
    pub deleted: bool,
}

/// Error types for data service queries
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("No data returned")]
    NoData,

    #[error("Bad response: {0}")]
    BadResponse(String),

    #[error("Query cancelled")]
    Cancelled,
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|text| STANDARD.decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

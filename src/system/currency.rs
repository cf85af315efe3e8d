//! Conversion of data service currencies into engine currency bundles.

use crate::client::{Currency, CurrencyDenomination};
use crate::engine::{CurrencyBundle, CurrencyDenominationBundle};

/// Address part of a currency uids naming a blockchain's native currency.
const NATIVE_ADDRESS: &str = "__native__";

/// Build a currency record from its `<blockchain_id>:<address>` uids.
///
/// # Arguments
/// * `uids` - Currency identifier, e.g. `ethereum-mainnet:0xdac17f958d2ee523a2206206994597c13d831ec7`.
/// * `name` - Display name.
/// * `code` - Currency code; lower-cased.
/// * `type_` - `erc20` or `native`, in any case.
/// * `decimals` - Decimals of the default denomination.
///
/// # Returns
/// `None` if `uids` has no blockchain separator or the type is not supported.
pub fn currency_from_uids(uids: &str, name: &str, code: &str, type_: &str, decimals: u8) -> Option<Currency> {
	let (blockchain_id, address) = uids.split_once(':')?;

	let type_ = type_.to_lowercase();
	if type_ != "erc20" && type_ != "native" {
		return None;
	}

	let code = code.to_lowercase();
	let denominations = erc20_denominations(&code, decimals);

	Some(Currency {
		id: uids.to_string(),
		name: name.to_string(),
		code,
		type_,
		blockchain_id: blockchain_id.to_string(),
		address: (address != NATIVE_ADDRESS).then(|| address.to_string()),
		verified: true,
		denominations,
	})
}

/// Base (integer) and default denominations of a token.
fn erc20_denominations(code: &str, decimals: u8) -> Vec<CurrencyDenomination> {
	let upper = code.to_uppercase();
	vec![
		CurrencyDenomination {
			name: format!("{} Token INT", upper),
			code: format!("{}i", code),
			decimals: 0,
			symbol: format!("{}i", code),
		},
		CurrencyDenomination {
			name: format!("{} Token", upper),
			code: code.to_string(),
			decimals,
			symbol: code.to_string(),
		},
	]
}

pub fn currency_bundle(currency: &Currency) -> CurrencyBundle {
	CurrencyBundle {
		id: currency.id.clone(),
		name: currency.name.clone(),
		code: currency.code.clone(),
		type_: currency.type_.clone(),
		blockchain_id: currency.blockchain_id.clone(),
		address: currency.address.clone(),
		verified: currency.verified,
		denominations: currency
			.denominations
			.iter()
			.map(|denomination| CurrencyDenominationBundle {
				name: denomination.name.clone(),
				code: denomination.code.clone(),
				symbol: denomination.symbol.clone(),
				decimals: denomination.decimals,
			})
			.collect(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_currency_from_token_uids() {
		let currency = currency_from_uids("ethereum-mainnet:0xdac17f", "Tether", "USDT", "ERC20", 6)
			.expect("erc20 currency");

		assert_eq!(currency.blockchain_id, "ethereum-mainnet");
		assert_eq!(currency.address.as_deref(), Some("0xdac17f"));
		assert_eq!(currency.code, "usdt");
		assert_eq!(currency.type_, "erc20");
		assert!(currency.verified);
		assert_eq!(currency.denominations.len(), 2);
		assert_eq!(currency.denominations[0].decimals, 0);
		assert_eq!(currency.denominations[0].code, "usdti");
		assert_eq!(currency.denominations[1].decimals, 6);
	}

	#[test]
	fn test_native_currency_has_no_address() {
		let currency = currency_from_uids("bitcoin-mainnet:__native__", "Bitcoin", "btc", "native", 8)
			.expect("native currency");
		assert_eq!(currency.address, None);
	}

	#[test]
	fn test_rejects_malformed_uids_and_types() {
		assert!(currency_from_uids("no-separator", "X", "x", "erc20", 18).is_none());
		assert!(currency_from_uids("ethereum-mainnet:0x1", "X", "x", "erc721", 0).is_none());
	}

	#[test]
	fn test_currency_bundle_keeps_denominations() {
		let currency = currency_from_uids("ethereum-mainnet:0x1", "Token", "TKN", "erc20", 18).expect("currency");
		let bundle = currency_bundle(&currency);
		assert_eq!(bundle.id, "ethereum-mainnet:0x1");
		assert_eq!(bundle.address.as_deref(), Some("0x1"));
		assert_eq!(bundle.denominations.len(), 2);
		assert_eq!(bundle.denominations[1].code, "tkn");
		assert_eq!(bundle.denominations[1].decimals, 18);
	}
}

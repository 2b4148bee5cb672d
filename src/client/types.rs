// Response and parameter types for the znnd JSON-RPC API
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::{Address, Hash, TokenStandard};

#[derive(Serialize, Debug)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

#[derive(Deserialize, Debug)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HashHeight {
    pub hash: Hash,
    pub height: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    #[serde(default)]
    pub token_name: String,
    pub token_symbol: String,
    #[serde(default)]
    pub token_domain: String,
    pub decimals: u8,
    pub token_standard: TokenStandard,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceInfo {
    pub token_info: TokenInfo,
    #[serde(with = "big_amount")]
    pub balance: BigUint,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub address: Address,
    pub account_height: u64,
    #[serde(default)]
    pub balance_info_map: BTreeMap<TokenStandard, BalanceInfo>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Momentum {
    pub hash: Hash,
    pub previous_hash: Hash,
    pub height: u64,
    pub timestamp: u64,
}

impl Momentum {
    pub fn hash_height(&self) -> HashHeight {
        HashHeight {
            hash: self.hash,
            height: self.height,
        }
    }
}

/// One pending inbound transfer.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnreceivedBlock {
    /// Hash of the send block; referenced by the receive block.
    pub hash: Hash,
    /// Sender
    pub address: Address,
    pub to_address: Address,
    #[serde(with = "big_amount")]
    pub amount: BigUint,
    pub token_standard: TokenStandard,
    pub token_info: Option<TokenInfo>,
}

impl UnreceivedBlock {
    pub fn symbol(&self) -> &str {
        self.token_info.as_ref().map_or("", |t| t.token_symbol.as_str())
    }

    pub fn decimals(&self) -> u8 {
        self.token_info.as_ref().map_or(0, |t| t.decimals)
    }
}

/// A page of the unreceived queue. `count` is the queue size reported by
/// the node, `more` says entries remain beyond this page.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct UnreceivedPage {
    #[serde(default)]
    pub list: Vec<UnreceivedBlock>,
    pub count: u64,
    #[serde(default)]
    pub more: bool,
}

impl UnreceivedPage {
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.list.is_empty()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlasmaInfo {
    pub current_plasma: u64,
    pub max_plasma: u64,
    #[serde(with = "big_amount")]
    pub qsr_amount: BigUint,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequiredPowParams {
    pub address: Address,
    pub block_type: u64,
    pub to_address: Address,
    /// base64
    pub data: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequiredPow {
    pub available_plasma: u64,
    pub base_plasma: u64,
    pub required_difficulty: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UncollectedReward {
    pub address: Address,
    #[serde(with = "big_amount")]
    pub znn_amount: BigUint,
    #[serde(with = "big_amount")]
    pub qsr_amount: BigUint,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PillarStats {
    pub produced_momentums: u64,
    pub expected_momentums: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PillarInfo {
    pub name: String,
    pub rank: u64,
    pub producer_address: Address,
    pub current_stats: PillarStats,
    #[serde(with = "big_amount")]
    pub weight: BigUint,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PillarList {
    pub count: u64,
    #[serde(default)]
    pub list: Vec<PillarInfo>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Spork {
    pub id: Hash,
    pub name: String,
    pub description: String,
    pub activated: bool,
    #[serde(default)]
    pub enforcement_height: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SporkList {
    pub count: u64,
    #[serde(default)]
    pub list: Vec<Spork>,
}

/// Amounts travel as decimal strings; plain JSON numbers are accepted too.
pub mod big_amount {
    use num_bigint::BigUint;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => s.parse().map_err(D::Error::custom),
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(BigUint::from)
                .ok_or_else(|| D::Error::custom(format!("invalid amount {}", n))),
            other => Err(D::Error::custom(format!("invalid amount {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_info_parses_string_balances() {
        let zts = TokenStandard::ZERO.to_string();
        let addr = Address::from_public_key(&[1u8; 32]);
        let entry = json!({
            "tokenInfo": {
                "tokenName": "Zenon Coin",
                "tokenSymbol": "ZNN",
                "tokenDomain": "zenon.network",
                "decimals": 8,
                "tokenStandard": zts.clone(),
                "totalSupply": "1"
            },
            "balance": "123456789012345678901234567890"
        });
        let mut map = serde_json::Map::new();
        map.insert(zts, entry);
        let value = json!({
            "address": addr.to_string(),
            "accountHeight": 12,
            "balanceInfoMap": map
        });
        let info: AccountInfo = serde_json::from_value(value).unwrap();
        assert_eq!(info.account_height, 12);
        let entry = &info.balance_info_map[&TokenStandard::ZERO];
        assert_eq!(entry.token_info.token_symbol, "ZNN");
        assert_eq!(entry.balance.to_string(), "123456789012345678901234567890");
    }

    #[test]
    fn test_unreceived_page_defaults() {
        let page: UnreceivedPage = serde_json::from_value(json!({"count": 0})).unwrap();
        assert!(page.is_empty());
        assert!(!page.more);
    }

    #[test]
    fn test_amount_accepts_numbers() {
        #[derive(Deserialize)]
        struct W {
            #[serde(with = "big_amount")]
            a: BigUint,
        }
        let w: W = serde_json::from_value(json!({"a": 42})).unwrap();
        assert_eq!(w.a, BigUint::from(42u8));
        assert!(serde_json::from_value::<W>(json!({"a": -1})).is_err());
        assert!(serde_json::from_value::<W>(json!({"a": "x"})).is_err());
    }
}

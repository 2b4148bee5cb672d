// RPC client for making JSON-RPC requests to a znnd node
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::types::{
    AccountInfo, HashHeight, Momentum, PillarList, PlasmaInfo, RequiredPow, RequiredPowParams,
    RpcRequest, RpcResponse, SporkList, UncollectedReward, UnreceivedPage,
};
use super::LedgerApi;
use crate::address::Address;
use crate::config::NodeConfig;
use crate::error::{NomError, Result};
use crate::tx::block::AccountBlock;

pub struct RpcClient {
    url: String,
    client: Client,
    request_id: AtomicU64,
}

impl RpcClient {
    pub fn new(node: &NodeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(node.timeout_secs))
            .build()?;
        Ok(Self {
            url: node.url.clone(),
            client,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` and decode its `result` into `T`.
    pub fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!(id, method, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| NomError::Transport(format!("Error connecting to {}: {}", self.url, e)))?
            .error_for_status()?;

        let body: RpcResponse = response
            .json()
            .map_err(|e| NomError::MalformedResponse(format!("{}: {}", method, e)))?;
        decode_response(method, body)
    }

    pub fn plasma_get(&self, address: &Address) -> Result<PlasmaInfo> {
        self.call("embedded.plasma.get", json!([address]))
    }

    pub fn pillar_get_all(&self, page_index: u32, page_size: u32) -> Result<PillarList> {
        self.call("embedded.pillar.getAll", json!([page_index, page_size]))
    }

    pub fn pillar_uncollected_reward(&self, address: &Address) -> Result<UncollectedReward> {
        self.call("embedded.pillar.getUncollectedReward", json!([address]))
    }

    pub fn sentinel_uncollected_reward(&self, address: &Address) -> Result<UncollectedReward> {
        self.call("embedded.sentinel.getUncollectedReward", json!([address]))
    }

    pub fn stake_uncollected_reward(&self, address: &Address) -> Result<UncollectedReward> {
        self.call("embedded.stake.getUncollectedReward", json!([address]))
    }

    pub fn spork_get_all(&self, page_index: u32, page_size: u32) -> Result<SporkList> {
        self.call("embedded.spork.getAll", json!([page_index, page_size]))
    }
}

impl LedgerApi for RpcClient {
    fn account_info(&self, address: &Address) -> Result<AccountInfo> {
        self.call("ledger.getAccountInfoByAddress", json!([address]))
    }

    fn frontier_momentum(&self) -> Result<Momentum> {
        self.call("ledger.getFrontierMomentum", json!([]))
    }

    fn frontier_account_block(&self, address: &Address) -> Result<Option<HashHeight>> {
        self.call("ledger.getFrontierAccountBlock", json!([address]))
    }

    fn unreceived_blocks(
        &self,
        address: &Address,
        page_index: u32,
        page_size: u32,
    ) -> Result<UnreceivedPage> {
        self.call(
            "ledger.getUnreceivedBlocksByAddress",
            json!([address, page_index, page_size]),
        )
    }

    fn required_pow(&self, params: &RequiredPowParams) -> Result<RequiredPow> {
        self.call("embedded.plasma.getRequiredPoWForAccountBlock", json!([params]))
    }

    fn publish_raw_transaction(&self, block: &AccountBlock) -> Result<()> {
        let _: Value = self.call("ledger.publishRawTransaction", json!([block]))?;
        Ok(())
    }
}

fn decode_response<T: DeserializeOwned>(method: &str, body: RpcResponse) -> Result<T> {
    if let Some(error) = body.error {
        return Err(NomError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    serde_json::from_value(body.result.unwrap_or(Value::Null))
        .map_err(|e| NomError::MalformedResponse(format!("{}: {}", method, e)))
}

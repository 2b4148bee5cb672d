// Client module: the node's JSON-RPC API as consumed by the controller
#[cfg(test)]
pub mod mock;
pub mod rpc_client;
pub mod types;

pub use rpc_client::RpcClient;

use crate::address::Address;
use crate::error::Result;
use crate::tx::block::AccountBlock;
use types::{AccountInfo, HashHeight, Momentum, RequiredPow, RequiredPowParams, UnreceivedPage};

/// Ledger calls needed to build, publish and reconcile account blocks.
///
/// Implemented by [`RpcClient`] against a live node and by in-memory
/// ledgers in tests.
pub trait LedgerApi {
    fn account_info(&self, address: &Address) -> Result<AccountInfo>;

    fn frontier_momentum(&self) -> Result<Momentum>;

    /// Latest block of `address`'s chain, `None` for an empty chain.
    fn frontier_account_block(&self, address: &Address) -> Result<Option<HashHeight>>;

    fn unreceived_blocks(
        &self,
        address: &Address,
        page_index: u32,
        page_size: u32,
    ) -> Result<UnreceivedPage>;

    fn required_pow(&self, params: &RequiredPowParams) -> Result<RequiredPow>;

    fn publish_raw_transaction(&self, block: &AccountBlock) -> Result<()>;
}

use num_bigint::BigUint;
use std::cell::RefCell;

use nomctl::address::{Address, Hash, TokenStandard};
use nomctl::client::types::{
    AccountInfo, HashHeight, Momentum, RequiredPow, RequiredPowParams, TokenInfo, UnreceivedBlock,
    UnreceivedPage,
};
use nomctl::client::LedgerApi;
use nomctl::error::Result;
use nomctl::tx::AccountBlock;

/// A single account-chain plus its unreceived queue, kept in memory.
#[derive(Default)]
pub struct Ledger {
    pub queue: RefCell<Vec<UnreceivedBlock>>,
    pub chain: RefCell<Vec<AccountBlock>>,
    pub polls: RefCell<Vec<(u32, u32)>>,
}

impl Ledger {
    pub fn with_transfers(transfers: Vec<UnreceivedBlock>) -> Self {
        let ledger = Self::default();
        *ledger.queue.borrow_mut() = transfers;
        ledger
    }
}

pub fn transfer(seed: &str, to: Address, amount: u64, symbol: &str) -> UnreceivedBlock {
    UnreceivedBlock {
        hash: Hash::digest(seed.as_bytes()),
        address: Address::from_public_key(seed.as_bytes()),
        to_address: to,
        amount: BigUint::from(amount),
        token_standard: TokenStandard::ZERO,
        token_info: Some(TokenInfo {
            token_name: symbol.to_string(),
            token_symbol: symbol.to_string(),
            token_domain: "zenon.network".to_string(),
            decimals: 8,
            token_standard: TokenStandard::ZERO,
        }),
    }
}

impl LedgerApi for Ledger {
    fn account_info(&self, address: &Address) -> Result<AccountInfo> {
        Ok(AccountInfo {
            address: *address,
            account_height: self.chain.borrow().len() as u64,
            balance_info_map: Default::default(),
        })
    }

    fn frontier_momentum(&self) -> Result<Momentum> {
        Ok(Momentum {
            hash: Hash::digest(b"frontier"),
            previous_hash: Hash::ZERO,
            height: 77,
            timestamp: 0,
        })
    }

    fn frontier_account_block(&self, _address: &Address) -> Result<Option<HashHeight>> {
        Ok(self.chain.borrow().last().map(|b| HashHeight {
            hash: b.hash,
            height: b.height,
        }))
    }

    fn unreceived_blocks(
        &self,
        _address: &Address,
        page_index: u32,
        page_size: u32,
    ) -> Result<UnreceivedPage> {
        self.polls.borrow_mut().push((page_index, page_size));
        let queue = self.queue.borrow();
        let start = (page_index as usize * page_size as usize).min(queue.len());
        let end = (start + page_size as usize).min(queue.len());
        Ok(UnreceivedPage {
            list: queue[start..end].to_vec(),
            count: queue.len() as u64,
            more: end < queue.len(),
        })
    }

    fn required_pow(&self, _params: &RequiredPowParams) -> Result<RequiredPow> {
        Ok(RequiredPow {
            available_plasma: 100_000,
            base_plasma: 21_000,
            required_difficulty: 0,
        })
    }

    fn publish_raw_transaction(&self, block: &AccountBlock) -> Result<()> {
        self.queue
            .borrow_mut()
            .retain(|t| t.hash != block.from_block_hash);
        self.chain.borrow_mut().push(block.clone());
        Ok(())
    }
}

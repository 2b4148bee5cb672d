//! In-memory ledger for unit tests.

use num_bigint::BigUint;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use super::types::{
    AccountInfo, HashHeight, Momentum, RequiredPow, RequiredPowParams, TokenInfo, UnreceivedBlock,
    UnreceivedPage,
};
use super::LedgerApi;
use crate::address::{Address, Hash, TokenStandard};
use crate::error::{NomError, Result};
use crate::tx::block::AccountBlock;

pub struct MockLedger {
    queue: RefCell<Vec<UnreceivedBlock>>,
    arrivals: RefCell<Vec<UnreceivedBlock>>,
    published: RefCell<Vec<AccountBlock>>,
    frontier: Cell<Option<HashHeight>>,
    failing: RefCell<HashSet<Hash>>,
    failing_times: RefCell<HashMap<Hash, u32>>,
    fail_polls: Cell<bool>,
    polls: Cell<u32>,
    confirmation_lag: Cell<u32>,
    // received sends still listed, with the polls left before they drop out
    lingering: RefCell<Vec<(Hash, u32)>>,
    required_difficulty: Cell<u64>,
    momentum: Momentum,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(Vec::new()),
            arrivals: RefCell::new(Vec::new()),
            published: RefCell::new(Vec::new()),
            frontier: Cell::new(None),
            failing: RefCell::new(HashSet::new()),
            failing_times: RefCell::new(HashMap::new()),
            fail_polls: Cell::new(false),
            polls: Cell::new(0),
            confirmation_lag: Cell::new(0),
            lingering: RefCell::new(Vec::new()),
            required_difficulty: Cell::new(0),
            momentum: Momentum {
                hash: Hash::digest(b"momentum"),
                previous_hash: Hash::digest(b"parent"),
                height: 1000,
                timestamp: 1_700_000_000,
            },
        }
    }

    pub fn momentum(&self) -> &Momentum {
        &self.momentum
    }

    pub fn push_unreceived(&self, block: UnreceivedBlock) {
        self.queue.borrow_mut().push(block);
    }

    /// Queued to arrive right after the next successful publish.
    pub fn push_arrival(&self, block: UnreceivedBlock) {
        self.arrivals.borrow_mut().push(block);
    }

    pub fn fail_publish_of(&self, send_hash: Hash) {
        self.failing.borrow_mut().insert(send_hash);
    }

    /// Reject the first `times` receives of `send_hash`, then accept.
    pub fn fail_publish_times(&self, send_hash: Hash, times: u32) {
        self.failing_times.borrow_mut().insert(send_hash, times);
    }

    pub fn heal(&self, send_hash: &Hash) {
        self.failing.borrow_mut().remove(send_hash);
    }

    pub fn set_fail_polls(&self, fail: bool) {
        self.fail_polls.set(fail);
    }

    /// Keep a received send listed for `polls` more polls, the way a node
    /// does until the receive is confirmed in a momentum.
    pub fn set_confirmation_lag(&self, polls: u32) {
        self.confirmation_lag.set(polls);
    }

    pub fn set_frontier(&self, frontier: Option<HashHeight>) {
        self.frontier.set(frontier);
    }

    pub fn set_required_difficulty(&self, difficulty: u64) {
        self.required_difficulty.set(difficulty);
    }

    pub fn published(&self) -> Vec<AccountBlock> {
        self.published.borrow().clone()
    }

    pub fn polls(&self) -> u32 {
        self.polls.get()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    fn settle_lingering(&self) {
        let mut lingering = self.lingering.borrow_mut();
        let mut queue = self.queue.borrow_mut();
        lingering.retain_mut(|(hash, left)| {
            if *left == 0 {
                queue.retain(|b| b.hash != *hash);
                false
            } else {
                *left -= 1;
                true
            }
        });
    }
}

/// An unreceived transfer of `amount` base units with the given token
/// metadata, keyed by `seed`.
pub fn transfer(seed: &str, to: Address, amount: u64, symbol: &str, decimals: u8) -> UnreceivedBlock {
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
            decimals,
            token_standard: TokenStandard::ZERO,
        }),
    }
}

impl LedgerApi for MockLedger {
    fn account_info(&self, address: &Address) -> Result<AccountInfo> {
        Ok(AccountInfo {
            address: *address,
            account_height: self.frontier.get().map_or(0, |f| f.height),
            balance_info_map: Default::default(),
        })
    }

    fn frontier_momentum(&self) -> Result<Momentum> {
        Ok(self.momentum.clone())
    }

    fn frontier_account_block(&self, _address: &Address) -> Result<Option<HashHeight>> {
        Ok(self.frontier.get())
    }

    fn unreceived_blocks(
        &self,
        _address: &Address,
        page_index: u32,
        page_size: u32,
    ) -> Result<UnreceivedPage> {
        self.polls.set(self.polls.get() + 1);
        if self.fail_polls.get() {
            return Err(NomError::Transport("connection refused".to_string()));
        }
        self.settle_lingering();
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
            available_plasma: 21_000,
            base_plasma: 21_000,
            required_difficulty: self.required_difficulty.get(),
        })
    }

    fn publish_raw_transaction(&self, block: &AccountBlock) -> Result<()> {
        if self
            .lingering
            .borrow()
            .iter()
            .any(|(h, _)| *h == block.from_block_hash)
        {
            return Err(NomError::Rpc {
                code: -32000,
                message: "send block already received".to_string(),
            });
        }
        if let Some(left) = self.failing_times.borrow_mut().get_mut(&block.from_block_hash) {
            if *left > 0 {
                *left -= 1;
                return Err(NomError::Rpc {
                    code: -32000,
                    message: "temporarily rejected".to_string(),
                });
            }
        }
        if self.failing.borrow().contains(&block.from_block_hash) {
            return Err(NomError::Rpc {
                code: -32000,
                message: "rejected".to_string(),
            });
        }
        self.published.borrow_mut().push(block.clone());
        match self.confirmation_lag.get() {
            0 => self
                .queue
                .borrow_mut()
                .retain(|b| b.hash != block.from_block_hash),
            lag => self
                .lingering
                .borrow_mut()
                .push((block.from_block_hash, lag)),
        }
        self.frontier.set(Some(HashHeight {
            hash: block.hash,
            height: block.height,
        }));
        let arrived: Vec<_> = self.arrivals.borrow_mut().drain(..).collect();
        self.queue.borrow_mut().extend(arrived);
        Ok(())
    }
}

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::{debug, info};

use super::block::AccountBlock;
use crate::address::Hash;
use crate::client::types::RequiredPowParams;
use crate::client::LedgerApi;
use crate::error::{NomError, Result};
use crate::signer::Signer;

/// Fills in the chain-dependent fields of a template, signs it and
/// publishes it.
pub struct TransactionSender<'a, L: LedgerApi> {
    ledger: &'a L,
    signer: &'a Signer,
}

impl<'a, L: LedgerApi> TransactionSender<'a, L> {
    pub fn new(ledger: &'a L, signer: &'a Signer) -> Self {
        Self { ledger, signer }
    }

    /// Autofill and sign `block` without publishing it.
    ///
    /// Height and previous hash come from the account's frontier block,
    /// the acknowledged momentum from the frontier momentum. Plasma must
    /// cover the block: proof-of-work is never computed here.
    pub fn prepare(&self, mut block: AccountBlock) -> Result<AccountBlock> {
        let address = self.signer.address();
        block.address = address;
        block.public_key = self.signer.public_key().to_vec();

        match self.ledger.frontier_account_block(&address)? {
            Some(frontier) => {
                block.height = frontier.height + 1;
                block.previous_hash = frontier.hash;
            }
            None => {
                block.height = 1;
                block.previous_hash = Hash::ZERO;
            }
        }
        block.momentum_acknowledged = self.ledger.frontier_momentum()?.hash_height();

        let pow = self.ledger.required_pow(&RequiredPowParams {
            address,
            block_type: block.block_type,
            to_address: block.to_address,
            data: BASE64.encode(&block.data),
        })?;
        if pow.required_difficulty > 0 {
            return Err(NomError::InsufficientPlasma {
                available: pow.available_plasma,
                required: pow.base_plasma,
                difficulty: pow.required_difficulty,
            });
        }
        block.fused_plasma = pow.base_plasma;
        block.difficulty = 0;
        block.nonce = [0u8; 8];

        block.hash = block.compute_hash()?;
        block.signature = self.signer.sign(block.hash.as_bytes())?.to_bytes().to_vec();
        debug!(height = block.height, hash = %block.hash, "block prepared");
        Ok(block)
    }

    /// Prepare and publish `block`, returning its hash.
    pub fn send(&self, block: AccountBlock) -> Result<Hash> {
        let block = self.prepare(block)?;
        self.ledger.publish_raw_transaction(&block)?;
        info!(
            "Published block {} at height {} on {}",
            block.hash, block.height, block.address
        );
        Ok(block.hash)
    }
}

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::address::{sha3, Address, Hash, TokenStandard};
use crate::client::types::{big_amount, HashHeight};
use crate::error::NomError;

pub const BLOCK_VERSION: u64 = 1;
pub const BLOCK_TYPE_USER_SEND: u64 = 2;
pub const BLOCK_TYPE_USER_RECEIVE: u64 = 3;

const AMOUNT_LEN: usize = 32;

/// A block on an account-chain, in the shape `ledger.publishRawTransaction`
/// accepts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountBlock {
    pub version: u64,
    pub chain_identifier: u64,
    pub block_type: u64,
    pub hash: Hash,
    pub previous_hash: Hash,
    pub height: u64,
    pub momentum_acknowledged: HashHeight,
    pub address: Address,
    pub to_address: Address,
    #[serde(with = "big_amount")]
    pub amount: BigUint,
    pub token_standard: TokenStandard,
    pub from_block_hash: Hash,
    #[serde(default)]
    pub descendant_blocks: Vec<AccountBlock>,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub fused_plasma: u64,
    pub difficulty: u64,
    #[serde(with = "nonce_hex")]
    pub nonce: [u8; 8],
    #[serde(default)]
    pub changes_hash: Hash,
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

impl AccountBlock {
    fn template(chain_identifier: u64, block_type: u64) -> Self {
        Self {
            version: BLOCK_VERSION,
            chain_identifier,
            block_type,
            hash: Hash::ZERO,
            previous_hash: Hash::ZERO,
            height: 0,
            momentum_acknowledged: HashHeight::default(),
            address: Address::ZERO,
            to_address: Address::ZERO,
            amount: BigUint::default(),
            token_standard: TokenStandard::ZERO,
            from_block_hash: Hash::ZERO,
            descendant_blocks: Vec::new(),
            data: Vec::new(),
            fused_plasma: 0,
            difficulty: 0,
            nonce: [0u8; 8],
            changes_hash: Hash::ZERO,
            public_key: Vec::new(),
            signature: Vec::new(),
        }
    }

    /// Receive block acknowledging the send block `from_block_hash`.
    pub fn receive(chain_identifier: u64, from_block_hash: Hash) -> Self {
        Self {
            from_block_hash,
            ..Self::template(chain_identifier, BLOCK_TYPE_USER_RECEIVE)
        }
    }

    pub fn send(
        chain_identifier: u64,
        to_address: Address,
        token_standard: TokenStandard,
        amount: BigUint,
        data: Vec<u8>,
    ) -> Self {
        Self {
            to_address,
            token_standard,
            amount,
            data,
            ..Self::template(chain_identifier, BLOCK_TYPE_USER_SEND)
        }
    }

    pub fn is_send(&self) -> bool {
        self.block_type == BLOCK_TYPE_USER_SEND
    }

    /// Canonical bytes covered by the block hash.
    pub fn hash_input(&self) -> Result<Vec<u8>, NomError> {
        let mut buf = Vec::with_capacity(320);
        buf.extend_from_slice(&self.version.to_be_bytes());
        buf.extend_from_slice(&self.chain_identifier.to_be_bytes());
        buf.extend_from_slice(&self.block_type.to_be_bytes());
        buf.extend_from_slice(self.previous_hash.as_bytes());
        buf.extend_from_slice(&self.height.to_be_bytes());
        buf.extend_from_slice(self.momentum_acknowledged.hash.as_bytes());
        buf.extend_from_slice(&self.momentum_acknowledged.height.to_be_bytes());
        buf.extend_from_slice(self.address.as_bytes());
        buf.extend_from_slice(self.to_address.as_bytes());
        buf.extend_from_slice(&amount_bytes(&self.amount)?);
        buf.extend_from_slice(self.token_standard.as_bytes());
        buf.extend_from_slice(self.from_block_hash.as_bytes());
        buf.extend_from_slice(&self.descendants_hash());
        buf.extend_from_slice(&sha3(&self.data));
        buf.extend_from_slice(&self.fused_plasma.to_be_bytes());
        buf.extend_from_slice(&self.difficulty.to_be_bytes());
        buf.extend_from_slice(&self.nonce);
        Ok(buf)
    }

    pub fn compute_hash(&self) -> Result<Hash, NomError> {
        Ok(Hash::digest(&self.hash_input()?))
    }

    fn descendants_hash(&self) -> [u8; 32] {
        let mut joined = Vec::with_capacity(32 * self.descendant_blocks.len());
        for d in &self.descendant_blocks {
            joined.extend_from_slice(d.hash.as_bytes());
        }
        sha3(&joined)
    }
}

/// Amounts are hashed as 32-byte big-endian words.
fn amount_bytes(amount: &BigUint) -> Result<[u8; AMOUNT_LEN], NomError> {
    let raw = amount.to_bytes_be();
    if raw.len() > AMOUNT_LEN {
        return Err(NomError::InvalidArgument(format!("amount {} does not fit 256 bits", amount)));
    }
    let mut out = [0u8; AMOUNT_LEN];
    out[AMOUNT_LEN - raw.len()..].copy_from_slice(&raw);
    Ok(out)
}

mod base64_bytes {
    use super::BASE64;
    use base64::Engine;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        BASE64.decode(s.as_bytes()).map_err(D::Error::custom)
    }
}

mod nonce_hex {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(nonce: &[u8; 8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(nonce))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 8], D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut out = [0u8; 8];
        hex::decode_to_slice(&s, &mut out).map_err(D::Error::custom)?;
        Ok(out)
    }
}

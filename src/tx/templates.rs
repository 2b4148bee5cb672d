//! Unsigned block templates for the commands the controller issues.

use num_bigint::BigUint;

use super::abi::{encode_call, AbiValue};
use super::block::AccountBlock;
use crate::address::{
    Address, Hash, TokenStandard, PILLAR_CONTRACT, SENTINEL_CONTRACT, SPORK_CONTRACT,
    STAKE_CONTRACT, ZNN_TOKEN_STANDARD,
};
use crate::error::NomError;

pub const SPORK_NAME_MIN_LEN: usize = 5;
pub const SPORK_NAME_MAX_LEN: usize = 40;
pub const SPORK_DESCRIPTION_MAX_LEN: usize = 400;

/// Builds templates for one chain.
#[derive(Debug, Clone, Copy)]
pub struct Templates {
    chain_id: u64,
}

impl Templates {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }

    pub fn receive(&self, from_block_hash: Hash) -> AccountBlock {
        AccountBlock::receive(self.chain_id, from_block_hash)
    }

    pub fn send(&self, to: Address, zts: TokenStandard, amount: BigUint) -> AccountBlock {
        AccountBlock::send(self.chain_id, to, zts, amount, Vec::new())
    }

    pub fn pillar_collect_reward(&self) -> Result<AccountBlock, NomError> {
        self.contract_call(PILLAR_CONTRACT, "CollectReward()", &[])
    }

    pub fn pillar_delegate(&self, name: &str) -> Result<AccountBlock, NomError> {
        if name.is_empty() {
            return Err(NomError::InvalidArgument("pillar name is empty".to_string()));
        }
        self.contract_call(PILLAR_CONTRACT, "Delegate(string)", &[AbiValue::Str(name.to_string())])
    }

    pub fn pillar_undelegate(&self) -> Result<AccountBlock, NomError> {
        self.contract_call(PILLAR_CONTRACT, "Undelegate()", &[])
    }

    pub fn sentinel_collect_reward(&self) -> Result<AccountBlock, NomError> {
        self.contract_call(SENTINEL_CONTRACT, "CollectReward()", &[])
    }

    pub fn stake_collect_reward(&self) -> Result<AccountBlock, NomError> {
        self.contract_call(STAKE_CONTRACT, "CollectReward()", &[])
    }

    pub fn spork_create(&self, name: &str, description: &str) -> Result<AccountBlock, NomError> {
        validate_spork(name, description)?;
        self.contract_call(
            SPORK_CONTRACT,
            "CreateSpork(string,string)",
            &[AbiValue::Str(name.to_string()), AbiValue::Str(description.to_string())],
        )
    }

    pub fn spork_activate(&self, id: Hash) -> Result<AccountBlock, NomError> {
        self.contract_call(SPORK_CONTRACT, "ActivateSpork(hash)", &[AbiValue::Hash(id)])
    }

    fn contract_call(
        &self,
        contract: &str,
        signature: &str,
        args: &[AbiValue],
    ) -> Result<AccountBlock, NomError> {
        let to: Address = contract.parse()?;
        let zts: TokenStandard = ZNN_TOKEN_STANDARD.parse()?;
        Ok(AccountBlock::send(
            self.chain_id,
            to,
            zts,
            BigUint::default(),
            encode_call(signature, args),
        ))
    }
}

pub fn validate_spork(name: &str, description: &str) -> Result<(), NomError> {
    let n = name.chars().count();
    if !(SPORK_NAME_MIN_LEN..=SPORK_NAME_MAX_LEN).contains(&n) {
        return Err(NomError::InvalidArgument(format!(
            "Spork name must be {} to {} characters in length",
            SPORK_NAME_MIN_LEN, SPORK_NAME_MAX_LEN
        )));
    }
    if description.chars().count() > SPORK_DESCRIPTION_MAX_LEN {
        return Err(NomError::InvalidArgument(format!(
            "Spork description cannot exceed {} characters in length",
            SPORK_DESCRIPTION_MAX_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::block::{BLOCK_TYPE_USER_RECEIVE, BLOCK_TYPE_USER_SEND};

    #[test]
    fn test_receive_template() {
        let t = Templates::new(3);
        let h = Hash::digest(b"x");
        let b = t.receive(h);
        assert_eq!(b.block_type, BLOCK_TYPE_USER_RECEIVE);
        assert_eq!(b.chain_identifier, 3);
        assert_eq!(b.from_block_hash, h);
        assert_eq!(b.amount, BigUint::default());
    }

    #[test]
    fn test_spork_limits() {
        assert!(validate_spork("abcd", "").is_err());
        assert!(validate_spork("abcde", "").is_ok());
        assert!(validate_spork(&"a".repeat(40), &"d".repeat(400)).is_ok());
        assert!(validate_spork(&"a".repeat(41), "").is_err());
        assert!(validate_spork("abcde", &"d".repeat(401)).is_err());
    }

    #[test]
    fn test_send_template_carries_amount() {
        let t = Templates::new(1);
        let to = Address::from_public_key(&[4u8; 32]);
        let b = t.send(to, TokenStandard::ZERO, BigUint::from(7u8));
        assert_eq!(b.block_type, BLOCK_TYPE_USER_SEND);
        assert_eq!(b.to_address, to);
        assert_eq!(b.amount, BigUint::from(7u8));
        assert!(b.data.is_empty());
    }

    #[test]
    fn test_invalid_spork_never_reaches_encoding() {
        let t = Templates::new(1);
        assert!(matches!(t.spork_create("abc", "d"), Err(NomError::InvalidArgument(_))));
        assert!(matches!(t.pillar_delegate(""), Err(NomError::InvalidArgument(_))));
    }
}

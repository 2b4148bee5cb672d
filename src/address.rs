//! Ledger identifiers: addresses, token standards and hashes.
//!
//! Addresses are `0x00 || sha3_256(pubkey)[..19]` for users and start
//! with `0x02` for embedded contracts; both render as bech32 with HRP `z`.
//! Token standards are 10 bytes rendered with HRP `zts`.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;

use crate::error::NomError;

pub const ADDRESS_LEN: usize = 20;
pub const ADDRESS_CORE_LEN: usize = 19;
pub const USER_ADDRESS_BYTE: u8 = 0x00;
pub const CONTRACT_ADDRESS_BYTE: u8 = 0x02;
pub const TOKEN_STANDARD_LEN: usize = 10;
pub const HASH_LEN: usize = 32;

const ADDRESS_HRP: Hrp = Hrp::parse_unchecked("z");
const TOKEN_STANDARD_HRP: Hrp = Hrp::parse_unchecked("zts");

pub const PILLAR_CONTRACT: &str = "z1qxemdeddedxpyllarxxxxxxxxxxxxxxxsy3fmg";
pub const PLASMA_CONTRACT: &str = "z1qxemdeddedxplasmaxxxxxxxxxxxxxxxxsctrp";
pub const SENTINEL_CONTRACT: &str = "z1qxemdeddedxsentynelxxxxxxxxxxxxxwy0r2r";
pub const STAKE_CONTRACT: &str = "z1qxemdeddedxstakexxxxxxxxxxxxxxxxjv8v62";
pub const SPORK_CONTRACT: &str = "z1qxemdeddedxsp0rkxxxxxxxxxxxxxxxx956u48";

pub const ZNN_TOKEN_STANDARD: &str = "zts1znnxxxxxxxxxxxxx9z4ulx";
pub const QSR_TOKEN_STANDARD: &str = "zts1qsrxxxxxxxxxxxxxmrhjll";

/// SHA3-256, the ledger's content hash.
pub fn sha3(data: &[u8]) -> [u8; HASH_LEN] {
    Sha3_256::digest(data).into()
}

fn decode_bech32<const N: usize>(s: &str, hrp: Hrp) -> Option<[u8; N]> {
    let (found, data) = bech32::decode(s).ok()?;
    if found != hrp {
        return None;
    }
    data.try_into().ok()
}

fn encode_bech32(hrp: Hrp, data: &[u8]) -> String {
    // Encoding only fails past the bech32 length limit, far above our payloads.
    bech32::encode::<Bech32>(hrp, data).unwrap_or_default()
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = sha3(public_key);
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = USER_ADDRESS_BYTE;
        bytes[1..].copy_from_slice(&digest[..ADDRESS_CORE_LEN]);
        Address(bytes)
    }

    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_embedded(&self) -> bool {
        self.0[0] == CONTRACT_ADDRESS_BYTE
    }
}

impl FromStr for Address {
    type Err = NomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_bech32::<ADDRESS_LEN>(s.trim(), ADDRESS_HRP)
            .map(Address)
            .ok_or_else(|| NomError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_bech32(ADDRESS_HRP, &self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TokenStandard([u8; TOKEN_STANDARD_LEN]);

impl TokenStandard {
    pub const ZERO: TokenStandard = TokenStandard([0u8; TOKEN_STANDARD_LEN]);

    pub fn as_bytes(&self) -> &[u8; TOKEN_STANDARD_LEN] {
        &self.0
    }
}

impl FromStr for TokenStandard {
    type Err = NomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_bech32::<TOKEN_STANDARD_LEN>(s.trim(), TOKEN_STANDARD_HRP)
            .map(TokenStandard)
            .ok_or_else(|| NomError::InvalidTokenStandard(s.to_string()))
    }
}

impl fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_bech32(TOKEN_STANDARD_HRP, &self.0))
    }
}

impl fmt::Debug for TokenStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenStandard({})", self)
    }
}

/// A 32-byte content hash, rendered as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash([u8; HASH_LEN]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; HASH_LEN]);

    pub fn digest(data: &[u8]) -> Self {
        Hash(sha3(data))
    }

    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl FromStr for Hash {
    type Err = NomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().trim_start_matches("0x");
        let bytes = hex::decode(raw).map_err(|_| NomError::InvalidHash(s.to_string()))?;
        let bytes: [u8; HASH_LEN] = bytes
            .try_into()
            .map_err(|_| NomError::InvalidHash(s.to_string()))?;
        Ok(Hash(bytes))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self)
    }
}

// All three identifiers travel as strings on the wire.
macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(Address);
string_serde!(TokenStandard);
string_serde!(Hash);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip_string() {
        let addr = Address::from_public_key(&[7u8; 32]);
        let s = addr.to_string();
        assert!(s.starts_with("z1"));
        assert_eq!(s.parse::<Address>().unwrap(), addr);
        assert!(!addr.is_embedded());
    }

    #[test]
    fn test_address_rejects_foreign_hrp() {
        let ts = TokenStandard([1u8; TOKEN_STANDARD_LEN]).to_string();
        assert!(ts.parse::<Address>().is_err());
        assert!("not an address".parse::<Address>().is_err());
    }

    #[test]
    fn test_zero_address_encodes() {
        let s = Address::ZERO.to_string();
        assert_eq!(s.parse::<Address>().unwrap(), Address::ZERO);
    }

    #[test]
    fn test_hash_hex() {
        let h = Hash::digest(b"");
        // SHA3-256 of the empty string
        assert_eq!(
            h.to_string(),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
        assert_eq!(h.to_string().parse::<Hash>().unwrap(), h);
        assert!("abcd".parse::<Hash>().is_err());
    }

    #[test]
    fn test_serde_as_strings() {
        let addr = Address::from_public_key(&[9u8; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}

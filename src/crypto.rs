use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::address::Address;
use crate::error::NomError;

type HmacSha512 = Hmac<Sha512>;

/// BIP-44 coin type registered for the Network of Momentum.
pub const COIN_TYPE: u32 = 73404;
const HARDENED: u32 = 0x8000_0000;

/// Derivation path for an account index: m/44'/73404'/index'
pub fn derivation_path(index: u32) -> String {
    format!("m/44'/{}'/{}'", COIN_TYPE, index)
}

/// SLIP-0010 Ed25519 derivation along m/44'/73404'/index' (hardened only).
fn derive_secret(seed: &[u8], index: u32) -> Result<Zeroizing<[u8; 32]>, NomError> {
    let mut mac = HmacSha512::new_from_slice(b"ed25519 seed")
        .map_err(|e| NomError::Crypto(e.to_string()))?;
    mac.update(seed);
    let mut node = Zeroizing::new([0u8; 64]);
    node.copy_from_slice(&mac.finalize().into_bytes());

    for segment in [44, COIN_TYPE, index] {
        let mut mac = HmacSha512::new_from_slice(&node[32..])
            .map_err(|e| NomError::Crypto(e.to_string()))?;
        mac.update(&[0x00]);
        mac.update(&node[..32]);
        mac.update(&(segment | HARDENED).to_be_bytes());
        node.copy_from_slice(&mac.finalize().into_bytes());
    }

    let mut secret = Zeroizing::new([0u8; 32]);
    secret.copy_from_slice(&node[..32]);
    Ok(secret)
}

pub struct KeyPair {
    signing_key: SigningKey,
    index: u32,
}

impl KeyPair {
    /// Derive the key pair at `index` from a BIP-39 seed.
    pub fn derive(seed: &[u8], index: u32) -> Result<Self, NomError> {
        if index >= HARDENED {
            return Err(NomError::InvalidArgument(format!(
                "address index {} out of range",
                index
            )));
        }
        let secret = derive_secret(seed, index)?;
        Ok(KeyPair {
            signing_key: SigningKey::from_bytes(&secret),
            index,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(self.public_key().as_bytes())
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key().to_bytes())
    }

    /// Sign a message with the private key
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.public_key().verify(message, signature).is_ok()
    }
}

/// Verify a signature against a message with a raw 32-byte public key
pub fn verify_with_pubkey(message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    let (Ok(sig_bytes), Ok(pk_bytes)) = (
        <[u8; 64]>::try_from(signature),
        <[u8; 32]>::try_from(public_key),
    ) else {
        return false;
    };
    match VerifyingKey::from_bytes(&pk_bytes) {
        Ok(pk) => pk.verify(message, &Signature::from_bytes(&sig_bytes)).is_ok(),
        Err(_) => false,
    }
}

//! Local keystore: mnemonic-backed wallets encrypted at rest.
//!
//! A [`KeyStore`] is the decrypted form of one wallet. It is created from
//! fresh entropy or an imported mnemonic, encrypted into a [`KeyFile`] and
//! written once into the wallet directory. Every account key is derived on
//! demand from the seed, so nothing but the entropy is ever persisted.

pub mod directory;
pub mod file;

pub use directory::KeyStoreDirectory;
pub use file::{Argon2Params, KeyFile};

use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::RngCore;
use std::ops::Range;
use zeroize::Zeroizing;

use crate::address::Address;
use crate::crypto::KeyPair;
use crate::error::NomError;

/// 256 bits of entropy, 24 words.
pub const ENTROPY_LEN: usize = 32;

pub struct KeyStore {
    entropy: Zeroizing<Vec<u8>>,
    seed: Zeroizing<[u8; 64]>,
    mnemonic: Zeroizing<String>,
    base_address: Address,
}

impl KeyStore {
    /// Create a keystore from fresh OS entropy.
    pub fn generate() -> Result<Self, NomError> {
        let mut entropy = Zeroizing::new([0u8; ENTROPY_LEN]);
        OsRng
            .try_fill_bytes(&mut entropy[..])
            .map_err(|e| NomError::Crypto(format!("entropy source failed: {}", e)))?;
        Self::from_entropy(&entropy[..])
    }

    /// Import a mnemonic. The stored phrase is re-encoded from the recovered
    /// entropy, so the canonical English wordlist form is what gets kept.
    pub fn from_mnemonic(words: &str) -> Result<Self, NomError> {
        let parsed = Mnemonic::parse_in_normalized(Language::English, words)
            .map_err(|e| NomError::InvalidMnemonic(e.to_string()))?;
        let entropy = Zeroizing::new(parsed.to_entropy());
        Self::from_entropy(&entropy)
    }

    /// Rebuild a keystore from raw mnemonic entropy. Only 256-bit
    /// (24-word) entropy is accepted, since that is all a key file holds.
    pub fn from_entropy(entropy: &[u8]) -> Result<Self, NomError> {
        if entropy.len() != ENTROPY_LEN {
            return Err(NomError::InvalidMnemonic(format!(
                "expected 24 words ({} bits of entropy), got {} bits",
                ENTROPY_LEN * 8,
                entropy.len() * 8
            )));
        }
        let mnemonic = Mnemonic::from_entropy_in(Language::English, entropy)
            .map_err(|e| NomError::InvalidMnemonic(e.to_string()))?;
        let seed = Zeroizing::new(mnemonic.to_seed(""));
        let base_address = KeyPair::derive(&seed[..], 0)?.address();

        Ok(KeyStore {
            entropy: Zeroizing::new(entropy.to_vec()),
            seed,
            mnemonic: Zeroizing::new(mnemonic.to_string()),
            base_address,
        })
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn entropy(&self) -> &[u8] {
        &self.entropy
    }

    pub fn seed(&self) -> &[u8; 64] {
        &self.seed
    }

    /// Address of the key pair at index 0, fixed at creation.
    pub fn base_address(&self) -> Address {
        self.base_address
    }

    /// Derive the key pair at `index` (m/44'/73404'/index').
    pub fn derive_at(&self, index: u32) -> Result<KeyPair, NomError> {
        KeyPair::derive(&self.seed[..], index)
    }

    /// Addresses for a contiguous range of indices.
    pub fn derive_addresses(&self, range: Range<u32>) -> Result<Vec<(u32, Address)>, NomError> {
        range
            .map(|i| self.derive_at(i).map(|kp| (i, kp.address())))
            .collect()
    }

    /// Encrypt with the production Argon2id profile.
    pub fn encrypt(&self, passphrase: &str) -> Result<KeyFile, NomError> {
        KeyFile::encrypt(self, passphrase, Argon2Params::default())
    }

    pub fn encrypt_with(&self, passphrase: &str, params: Argon2Params) -> Result<KeyFile, NomError> {
        KeyFile::encrypt(self, passphrase, params)
    }
}

impl PartialEq for KeyStore {
    fn eq(&self, other: &Self) -> bool {
        *self.entropy == *other.entropy && self.base_address == other.base_address
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("base_address", &self.base_address)
            .field("mnemonic", &"<redacted>")
            .finish()
    }
}

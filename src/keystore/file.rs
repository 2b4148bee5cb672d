//! On-disk key file: Argon2id + AES-256-GCM over the mnemonic entropy.
//!
//! ```text
//! {
//!     "baseAddress": "z1...",
//!     "crypto": {
//!         "argon2Params": { "salt": "0x..", "memory": 65536, "iterations": 1, "parallelism": 4 },
//!         "cipherData": "0x..",
//!         "cipherName": "aes-256-gcm",
//!         "kdf": "argon2.IDKey",
//!         "nonce": "0x.."
//!     },
//!     "timestamp": 1700000000,
//!     "version": 1
//! }
//! ```
//!
//! The base address doubles as the integrity check: after decryption the
//! entropy is re-derived and must reproduce it exactly.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::{KeyStore, ENTROPY_LEN};
use crate::address::Address;
use crate::error::NomError;

pub const KEY_FILE_VERSION: u64 = 1;
pub const CIPHER_NAME: &str = "aes-256-gcm";
pub const KDF_NAME: &str = "argon2.IDKey";

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const ADDITIONAL_DATA: &[u8] = b"zenon";

/// Argon2id cost parameters. Stored alongside the salt so a file always
/// carries what it takes to re-derive its key; files that omit them fall
/// back to the production profile.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB
    #[serde(default = "default_memory")]
    pub memory: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory() -> u32 {
    64 * 1024
}

fn default_iterations() -> u32 {
    1
}

fn default_parallelism() -> u32 {
    4
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory: default_memory(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

impl Argon2Params {
    /// Minimal cost profile, for tests and throwaway keystores only.
    pub fn light() -> Self {
        Self {
            memory: 64,
            iterations: 1,
            parallelism: 1,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
struct Argon2Section {
    #[serde(with = "hex_0x")]
    salt: Vec<u8>,
    #[serde(flatten)]
    params: Argon2Params,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct CryptoSection {
    argon2_params: Argon2Section,
    #[serde(with = "hex_0x")]
    cipher_data: Vec<u8>,
    cipher_name: String,
    kdf: String,
    #[serde(with = "hex_0x")]
    nonce: Vec<u8>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyFile {
    base_address: Address,
    crypto: CryptoSection,
    timestamp: i64,
    version: u64,
    #[serde(skip)]
    path: PathBuf,
}

fn derive_key(
    passphrase: &str,
    salt: &[u8],
    params: &Argon2Params,
) -> Result<Zeroizing<[u8; KEY_LEN]>, NomError> {
    let argon2_params = Params::new(
        params.memory,
        params.iterations,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| NomError::CorruptKeyFile(format!("argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
        .map_err(|e| NomError::Crypto(format!("key derivation: {}", e)))?;
    Ok(key)
}

impl KeyFile {
    /// Encrypt the keystore entropy under `passphrase`.
    /// Each call draws a fresh salt and nonce.
    pub fn encrypt(ks: &KeyStore, passphrase: &str, params: Argon2Params) -> Result<Self, NomError> {
        let mut salt = vec![0u8; SALT_LEN];
        let mut nonce = vec![0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .and_then(|_| OsRng.try_fill_bytes(&mut nonce))
            .map_err(|e| NomError::Crypto(format!("entropy source failed: {}", e)))?;

        let key = derive_key(passphrase, &salt, &params)?;
        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|e| NomError::Crypto(e.to_string()))?;
        let cipher_data = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: ks.entropy(),
                    aad: ADDITIONAL_DATA,
                },
            )
            .map_err(|e| NomError::Crypto(format!("encryption: {}", e)))?;

        Ok(KeyFile {
            base_address: ks.base_address(),
            crypto: CryptoSection {
                argon2_params: Argon2Section { salt, params },
                cipher_data,
                cipher_name: CIPHER_NAME.to_string(),
                kdf: KDF_NAME.to_string(),
                nonce,
            },
            timestamp: chrono::Utc::now().timestamp(),
            version: KEY_FILE_VERSION,
            path: PathBuf::new(),
        })
    }

    /// Decrypt and rebuild the keystore.
    ///
    /// A failed authentication tag or a base address that does not match
    /// the re-derived one both mean [`NomError::WrongPassphrase`]; anything
    /// structurally off about the file is [`NomError::CorruptKeyFile`].
    pub fn decrypt(&self, passphrase: &str) -> Result<KeyStore, NomError> {
        if self.crypto.cipher_name != CIPHER_NAME {
            return Err(NomError::CorruptKeyFile(format!(
                "unsupported cipher {}",
                self.crypto.cipher_name
            )));
        }
        if self.crypto.kdf != KDF_NAME {
            return Err(NomError::CorruptKeyFile(format!("unsupported kdf {}", self.crypto.kdf)));
        }
        if self.crypto.nonce.len() != NONCE_LEN {
            return Err(NomError::CorruptKeyFile("bad nonce length".to_string()));
        }

        let section = &self.crypto.argon2_params;
        let key = derive_key(passphrase, &section.salt, &section.params)?;
        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|e| NomError::Crypto(e.to_string()))?;
        let entropy = cipher
            .decrypt(
                Nonce::from_slice(&self.crypto.nonce),
                Payload {
                    msg: &self.crypto.cipher_data,
                    aad: ADDITIONAL_DATA,
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| NomError::WrongPassphrase)?;

        if entropy.len() != ENTROPY_LEN {
            return Err(NomError::CorruptKeyFile(format!(
                "decrypted entropy is {} bytes",
                entropy.len()
            )));
        }

        let ks = KeyStore::from_entropy(&entropy)?;
        if ks.base_address() != self.base_address {
            debug!(expected = %self.base_address, got = %ks.base_address(), "base address mismatch");
            return Err(NomError::WrongPassphrase);
        }
        Ok(ks)
    }

    /// Load a key file; its path is taken from where it was read.
    pub fn read(path: &Path) -> Result<Self, NomError> {
        let content = fs::read_to_string(path)?;
        let mut kf: KeyFile = serde_json::from_str(&content)
            .map_err(|e| NomError::CorruptKeyFile(format!("{}: {}", path.display(), e)))?;
        kf.path = path.to_path_buf();
        Ok(kf)
    }

    /// Write the key file to `path`, owner read/write only.
    ///
    /// The content lands in a hidden sibling first and is then linked into
    /// place, so the final name either holds the complete file or does not
    /// exist. An existing file is never replaced.
    pub fn write_to(&mut self, path: &Path) -> Result<(), NomError> {
        if path.exists() {
            return Err(NomError::KeyStoreExists(path.display().to_string()));
        }
        let json = self.to_pretty_json()?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| NomError::InvalidArgument(format!("bad keyStore path {}", path.display())))?;
        let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

        let result = write_private(&tmp, json.as_bytes()).and_then(|_| {
            fs::hard_link(&tmp, path).map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => NomError::KeyStoreExists(path.display().to_string()),
                _ => NomError::Io(e),
            })
        });
        let _ = fs::remove_file(&tmp);
        result?;

        self.path = path.to_path_buf();
        info!(path = %path.display(), address = %self.base_address, "keyStore written");
        Ok(())
    }

    /// Indented JSON, 4 spaces.
    pub fn to_pretty_json(&self) -> Result<String, NomError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        String::from_utf8(buf).map_err(|e| NomError::Serialization(e.to_string()))
    }

    pub fn base_address(&self) -> Address {
        self.base_address
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn argon2_params(&self) -> Argon2Params {
        self.crypto.argon2_params.params
    }
}

fn write_private(path: &Path, data: &[u8]) -> Result<(), NomError> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}

mod hex_0x {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

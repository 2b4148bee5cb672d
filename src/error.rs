use thiserror::Error;

use crate::address::Hash;

#[derive(Error, Debug)]
pub enum NomError {
    // --- User input ---
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid hash: {0}")]
    InvalidHash(String),
    #[error("Invalid token standard: {0}")]
    InvalidTokenStandard(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // --- Keystore ---
    #[error("Invalid passphrase for keyStore")]
    WrongPassphrase,
    #[error("No keyStore in the wallet directory")]
    NoKeyStore,
    #[error("Multiple keyStores available, please select one with --keystore (use 'wallet list')")]
    AmbiguousKeyStore,
    #[error("The keyStore {0} does not exist in the wallet directory")]
    KeyStoreNotFound(String),
    #[error("A keyStore already exists at {0}")]
    KeyStoreExists(String),
    #[error("Corrupt keyStore file: {0}")]
    CorruptKeyFile(String),

    // --- Signing ---
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    // --- Transport / service ---
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Insufficient plasma: {available} available, {required} required (difficulty {difficulty})")]
    InsufficientPlasma {
        available: u64,
        required: u64,
        difficulty: u64,
    },

    // --- Receive reconciliation ---
    #[error("Receive stalled: no transfer was received in {rounds} consecutive round(s)")]
    ReceiveStalled { rounds: u32 },
    #[error("Receive aborted at {hash}: {reason}")]
    ReceiveAborted { hash: Hash, reason: String },
    #[error("Receive interrupted: {0}")]
    ReceiveFailed(String),

    // --- Fatal ---
    #[error("Crypto failure: {0}")]
    Crypto(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NomError {
    /// Whether the caller can reasonably correct the input and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NomError::InvalidMnemonic(_)
                | NomError::InvalidAddress(_)
                | NomError::InvalidHash(_)
                | NomError::InvalidTokenStandard(_)
                | NomError::InvalidArgument(_)
                | NomError::WrongPassphrase
                | NomError::NoKeyStore
                | NomError::AmbiguousKeyStore
                | NomError::KeyStoreNotFound(_)
                | NomError::KeyStoreExists(_)
                | NomError::InvalidMessage(_)
                | NomError::InsufficientPlasma { .. }
        )
    }
}

impl From<serde_json::Error> for NomError {
    fn from(err: serde_json::Error) -> Self {
        NomError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for NomError {
    fn from(err: reqwest::Error) -> Self {
        NomError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(NomError::WrongPassphrase.is_recoverable());
        assert!(NomError::AmbiguousKeyStore.is_recoverable());
        assert!(NomError::KeyStoreNotFound("x".into()).is_recoverable());
        assert!(!NomError::CorruptKeyFile("bad".into()).is_recoverable());
        assert!(!NomError::Transport("down".into()).is_recoverable());
    }
}

use ed25519_dalek::Signature;

use crate::address::Address;
use crate::crypto::KeyPair;
use crate::error::NomError;

/// A derived key pair bound to its address, used to sign outgoing blocks.
///
/// Lives for one invocation; the private key is dropped with it.
pub struct Signer {
    keypair: KeyPair,
    address: Address,
}

impl Signer {
    pub fn bind(keypair: KeyPair) -> Self {
        let address = keypair.address();
        Self { keypair, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn index(&self) -> u32 {
        self.keypair.index()
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.keypair.public_key().to_bytes()
    }

    /// Sign `message`. Empty messages are refused: every block signs a
    /// 32-byte hash, so an empty input is always a caller bug.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, NomError> {
        if message.is_empty() {
            return Err(NomError::InvalidMessage("empty message".to_string()));
        }
        Ok(self.keypair.sign(message))
    }

    pub fn sign_hex(&self, message: &[u8]) -> Result<String, NomError> {
        Ok(hex::encode(self.sign(message)?.to_bytes()))
    }
}

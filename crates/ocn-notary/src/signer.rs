//! Node signing identity.

use std::fmt;

use k256::ecdsa::SigningKey;

use crate::ecdsa::{address_of, Address};
use crate::errors::NotaryError;

/// The key pair a node signs envelopes and relay payloads with.
///
/// The registry lists the derived address as the node's signing address;
/// peers verify by recovery, so the public key never travels.
#[derive(Clone)]
pub struct NodeSigner {
    key: SigningKey,
    address: Address,
}

impl NodeSigner {
    /// Loads a signer from a 32-byte hex-encoded private key.
    pub fn from_hex(key_hex: &str) -> Result<Self, NotaryError> {
        let stripped = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let raw = hex::decode(stripped)
            .map_err(|e| NotaryError::InvalidKey(format!("not valid hex: {e}")))?;
        let key = SigningKey::from_slice(&raw)
            .map_err(|e| NotaryError::InvalidKey(e.to_string()))?;
        let address = address_of(key.verifying_key());
        Ok(Self { key, address })
    }

    /// Generates a fresh random signer. Development and test use.
    pub fn generate() -> Self {
        let key = SigningKey::random(&mut rand::thread_rng());
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.key
    }
}

impl fmt::Debug for NodeSigner {
    /// Key material never appears in logs; only the derived address does.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSigner").field("address", &self.address).finish()
    }
}

//! Ed25519 app signer used for Farcaster messages.
//!
//! # Security
//! - The seed is only ever held inside `SigningKey`
//! - `Debug` prints the public key, never the seed

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};

use crate::signing::{MessageSigner, Signature, SigningDomain, SigningError};

/// Ed25519 signer registered to an FID.
#[derive(Clone)]
pub struct ContentSigner {
    signing_key: SigningKey,
}

impl ContentSigner {
    /// Create from a hex-encoded 32-byte seed (with or without 0x prefix).
    pub fn from_hex(seed_hex: &str) -> Result<Self, SigningError> {
        let seed_hex = seed_hex.trim();
        let seed_hex = seed_hex.strip_prefix("0x").unwrap_or(seed_hex);
        let bytes = hex::decode(seed_hex).map_err(|e| SigningError::InvalidKey {
            domain: SigningDomain::Content,
            reason: format!("not hex: {}", e),
        })?;
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| SigningError::InvalidKey {
            domain: SigningDomain::Content,
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        })?;
        Ok(Self::from_seed(seed))
    }

    /// Create from a raw 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Public key as 0x-prefixed hex, the form hubs display.
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.verifying_key().as_bytes()))
    }
}

impl std::fmt::Debug for ContentSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentSigner")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

#[async_trait]
impl MessageSigner for ContentSigner {
    fn domain(&self) -> SigningDomain {
        SigningDomain::Content
    }

    async fn sign(&self, payload: &[u8]) -> Result<Signature, SigningError> {
        let signature = self.signing_key.sign(payload);
        Ok(Signature {
            domain: SigningDomain::Content,
            bytes: signature.to_bytes().to_vec(),
            signer: self.verifying_key().as_bytes().to_vec(),
        })
    }
}

//! Signing seam for published content.
//!
//! # Data Flow
//! ```text
//! payload bytes (built by a RemoteService)
//!     → MessageSigner::sign
//!         ├─ Wallet (blockchain/wallet.rs): secp256k1, EIP-191 personal_sign
//!         └─ ContentSigner (content.rs): Ed25519 over the message hash
//!     → Signature { domain, bytes, signer }
//! ```
//!
//! # Design Decisions
//! - Signing primitives come from `alloy` and `ed25519-dalek`; nothing here
//!   implements curve arithmetic
//! - The two domains are not interchangeable; every signature is tagged with
//!   its domain and consumers check it before use

pub mod content;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub use content::ContentSigner;

/// Which key family produced a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningDomain {
    /// Custody wallet key (secp256k1).
    Wallet,
    /// Dedicated app signer key (Ed25519).
    Content,
}

impl fmt::Display for SigningDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningDomain::Wallet => write!(f, "wallet (secp256k1)"),
            SigningDomain::Content => write!(f, "content (Ed25519)"),
        }
    }
}

/// Errors produced by a signer.
#[derive(Debug, Error)]
pub enum SigningError {
    /// Key material could not be parsed.
    #[error("invalid {domain} key: {reason}")]
    InvalidKey { domain: SigningDomain, reason: String },

    /// The signer refused or failed to sign.
    #[error("{domain} signing failed: {reason}")]
    Failed { domain: SigningDomain, reason: String },
}

/// A signature tagged with its domain and the signer's public identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub domain: SigningDomain,
    /// Raw signature bytes (65 for wallet, 64 for content).
    pub bytes: Vec<u8>,
    /// Address bytes (wallet) or public key bytes (content).
    pub signer: Vec<u8>,
}

/// Anything that can sign a payload for publication.
#[async_trait]
pub trait MessageSigner: Send + Sync {
    /// Key family of this signer.
    fn domain(&self) -> SigningDomain;

    /// Sign `payload`.
    async fn sign(&self, payload: &[u8]) -> Result<Signature, SigningError>;
}

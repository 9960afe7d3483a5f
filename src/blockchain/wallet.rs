//! Custody wallet and wallet-domain signing.
//!
//! # Security
//! - Private keys arrive through `credentials`, never read here
//! - Keys are never logged or serialized

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::signing::{MessageSigner, Signature, SigningDomain, SigningError};

/// Custody wallet backed by a local secp256k1 key.
#[derive(Debug, Clone)]
pub struct Wallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    ///
    /// # Security
    /// The private key is parsed and stored securely. It is never logged.
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let trimmed = private_key_hex.trim();
        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::debug!(address = %signer.address(), "Wallet initialized");

        Ok(Self { signer })
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Lowercase 0x address, the identifier form messaging networks use.
    pub fn address_lowercase(&self) -> String {
        format!("{:#x}", self.address())
    }

    /// Wallet wrapper for alloy providers that sign transactions.
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }

    /// Sign a message hash.
    pub async fn sign_hash(&self, hash: B256) -> BlockchainResult<alloy::signers::Signature> {
        self.signer
            .sign_hash(&hash)
            .await
            .map_err(|e| BlockchainError::Wallet(format!("Signing failed: {}", e)))
    }

    /// Sign arbitrary message bytes (with Ethereum prefix).
    pub async fn sign_message(&self, message: &[u8]) -> BlockchainResult<alloy::signers::Signature> {
        self.signer
            .sign_message(message)
            .await
            .map_err(|e| BlockchainError::Wallet(format!("Message signing failed: {}", e)))
    }
}

#[async_trait]
impl MessageSigner for Wallet {
    fn domain(&self) -> SigningDomain {
        SigningDomain::Wallet
    }

    async fn sign(&self, payload: &[u8]) -> Result<Signature, SigningError> {
        let signature = self.sign_message(payload).await.map_err(|e| SigningError::Failed {
            domain: SigningDomain::Wallet,
            reason: e.to_string(),
        })?;
        Ok(Signature {
            domain: SigningDomain::Wallet,
            bytes: signature.as_bytes().to_vec(),
            signer: self.address().to_vec(),
        })
    }
}

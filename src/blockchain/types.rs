//! Chain-specific types and error definitions.

use thiserror::Error;

pub use crate::config::schema::ChainEndpoint;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const ETHEREUM: ChainId = ChainId(1);
    pub const OPTIMISM: ChainId = ChainId(10);
    pub const BASE: ChainId = ChainId(8453);

    /// Human name for chains the agent knows about.
    pub fn name(&self) -> Option<&'static str> {
        match self.0 {
            1 => Some("Ethereum"),
            10 => Some("Optimism"),
            8453 => Some("Base"),
            _ => None,
        }
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Transaction receipt did not appear in time.
    #[error("Transaction {tx_hash} not mined after {secs} seconds")]
    ReceiptTimeout { tx_hash: String, secs: u64 },

    /// Transaction was reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Invalid private key format or signing error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(1u64);
        assert_eq!(chain_id, ChainId::ETHEREUM);
        assert_eq!(u64::from(chain_id), 1);
    }

    #[test]
    fn test_chain_id_display() {
        assert_eq!(ChainId::BASE.to_string(), "Base (8453)");
        assert_eq!(ChainId(42161).to_string(), "42161");
    }

    #[test]
    fn test_error_display() {
        let err = BlockchainError::ReceiptTimeout {
            tx_hash: "0xabc".to_string(),
            secs: 120,
        };
        assert_eq!(err.to_string(), "Transaction 0xabc not mined after 120 seconds");

        let err = BlockchainError::ChainMismatch { expected: 8453, actual: 10 };
        assert!(err.to_string().contains("8453"));
    }
}

//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! PRIVATE_KEY (resolved by credentials)
//!     → wallet.rs (key loading, message signing, tx signing wallet)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → transaction.rs (build quoted call, broadcast, wait for receipt)
//! ```
//!
//! # Security Constraints
//! - Private keys arrive through the credentials module only
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use transaction::{wait_for_receipt, MinedTransaction, QuotedCall};
pub use types::{BlockchainError, BlockchainResult, ChainId};
pub use wallet::Wallet;

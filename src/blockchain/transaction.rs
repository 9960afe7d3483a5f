//! Transaction building, broadcasting, and receipt monitoring.
//!
//! # Responsibilities
//! - Build call transactions from externally quoted parameters
//! - Broadcast through the wallet-carrying client
//! - Wait for the receipt within a deadline

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Parameters of an EIP-1559 call whose fees were quoted by a third party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedCall {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl QuotedCall {
    /// Build the transaction request, scaling both fee caps by `fee_multiplier`.
    ///
    /// Nonce and chain id are left to the provider's fillers.
    pub fn into_request(self, fee_multiplier: u64, gas_limit: u64) -> TransactionRequest {
        let multiplier = fee_multiplier as u128;
        TransactionRequest::default()
            .with_to(self.to)
            .with_input(self.data)
            .with_value(self.value)
            .with_max_fee_per_gas(self.max_fee_per_gas.saturating_mul(multiplier))
            .with_max_priority_fee_per_gas(self.max_priority_fee_per_gas.saturating_mul(multiplier))
            .with_gas_limit(gas_limit)
    }
}

/// Mined transaction summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedTransaction {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Wait for a transaction to be mined.
///
/// Failed receipt lookups are retried until the deadline.
///
/// # Arguments
/// * `client` - Client for the chain the transaction was sent to
/// * `tx_hash` - Transaction hash to monitor
/// * `timeout_secs` - Maximum time to wait for the receipt
/// * `poll_interval` - Time between receipt queries
pub async fn wait_for_receipt(
    client: &BlockchainClient,
    tx_hash: TxHash,
    timeout_secs: u64,
    poll_interval: Duration,
) -> BlockchainResult<MinedTransaction> {
    let result = timeout(Duration::from_secs(timeout_secs), async {
        let mut ticker = interval(poll_interval);

        loop {
            ticker.tick().await;

            let receipt = match client.get_transaction_receipt(tx_hash).await {
                Ok(Some(r)) => r,
                Ok(None) => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt lookup failed, retrying");
                    continue;
                }
            };

            if !receipt.status() {
                return Err(BlockchainError::Reverted(tx_hash.to_string()));
            }

            return Ok(MinedTransaction {
                tx_hash,
                block_number: receipt.block_number,
            });
        }
    })
    .await;

    match result {
        Ok(mined) => mined,
        Err(_) => Err(BlockchainError::ReceiptTimeout {
            tx_hash: tx_hash.to_string(),
            secs: timeout_secs,
        }),
    }
}

//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to a chain's JSON-RPC endpoint with the custody wallet attached
//! - Query chain state (chain id, balances, receipts) with failover
//! - Broadcast wallet-signed transactions through the primary endpoint

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainEndpoint, ChainId};
use crate::blockchain::wallet::Wallet;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers), all carrying the wallet.
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Endpoint this client was built from.
    endpoint: ChainEndpoint,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client for one chain.
    ///
    /// # Arguments
    /// * `endpoint` - Chain id and RPC URLs
    /// * `wallet` - Custody wallet used to sign transactions
    /// * `rpc_timeout_secs` - Per-call timeout
    pub fn connect(endpoint: &ChainEndpoint, wallet: &Wallet, rpc_timeout_secs: u64) -> BlockchainResult<Self> {
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = endpoint.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", endpoint.rpc_url, e))
        })?;
        providers.push(Arc::new(
            ProviderBuilder::new()
                .wallet(wallet.ethereum_wallet())
                .connect_http(primary_url),
        ) as Arc<dyn Provider + Send + Sync>);

        // 2. Add failover providers
        for url_str in &endpoint.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(
                    ProviderBuilder::new()
                        .wallet(wallet.ethereum_wallet())
                        .connect_http(url),
                ) as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::debug!(
            rpc_url = %endpoint.rpc_url,
            chain_id = endpoint.chain_id,
            "Blockchain client initialized"
        );

        Ok(Self {
            providers,
            endpoint: endpoint.clone(),
            timeout_duration: Duration::from_secs(rpc_timeout_secs),
        })
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.endpoint.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.endpoint.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Ask each provider in turn; the first answer wins.
    async fn first_answer<'a, T, E, F, Fut>(&'a self, what: &str, call: F) -> BlockchainResult<T>
    where
        F: Fn(&'a (dyn Provider + Send + Sync)) -> Fut,
        Fut: IntoFuture<Output = Result<T, E>>,
        E: fmt::Display,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, call(provider.as_ref())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, what, error = %e, "RPC error, trying next provider"),
                Err(_) => tracing::warn!(provider_idx = i, what, "RPC timeout, trying next provider"),
            }
        }
        Err(BlockchainError::Rpc(format!("All RPC providers failed ({})", what)))
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.first_answer("chain id", |p| p.get_chain_id()).await.map(ChainId)
    }

    pub async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        self.first_answer("balance", move |p| p.get_balance(address)).await
    }

    /// `None` until the transaction is mined.
    pub async fn get_transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<TransactionReceipt>> {
        self.first_answer("receipt", move |p| p.get_transaction_receipt(tx_hash)).await
    }

    /// Fill, sign and broadcast a transaction through the primary provider.
    ///
    /// Not retried on other providers: a second broadcast of a freshly filled
    /// request could spend a different nonce.
    pub async fn send_transaction(&self, tx: TransactionRequest) -> BlockchainResult<TxHash> {
        let fut = self.providers[0].send_transaction(tx);
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => Err(BlockchainError::Rpc(format!("Broadcast failed: {}", e))),
            Err(_) => Err(BlockchainError::Rpc(format!(
                "Broadcast timed out after {:?}",
                self.timeout_duration
            ))),
        }
    }

    /// Get the configured endpoint.
    pub fn endpoint(&self) -> &ChainEndpoint {
        &self.endpoint
    }
}

impl fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.endpoint.rpc_url)
            .field("chain_id", &self.endpoint.chain_id)
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}

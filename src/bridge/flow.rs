//! Native-currency bridging through Relay.
//!
//! quote → deposit transaction (wallet-signed) → receipt → bounded poll of
//! the intent status. Everything before the broadcast can fail freely;
//! after it, the outcome always carries the transaction hash and request id.

use alloy::primitives::{Address, TxHash, U256};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::blockchain::{wait_for_receipt, BlockchainClient, BlockchainError};
use crate::bridge::relay::RelayClient;
use crate::bridge::types::{BridgeError, BridgeOutcome, QuoteRequest};
use crate::config::{BridgeConfig, TimingConfig};
use crate::lifecycle::wait_for_shutdown;
use crate::publish::{BoundedPoll, PollOutcome, PollStatus};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Poll Relay until the intent settles, the cap is hit, or shutdown fires.
///
/// Status lookups that fail count as pending.
pub async fn await_intent(
    relay: &RelayClient,
    poll: &BoundedPoll,
    tx_hash: TxHash,
    request_id: String,
    block_number: Option<u64>,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<BridgeOutcome, BridgeError> {
    tracing::info!(%request_id, max_attempts = poll.max_attempts(), "Waiting for bridge to complete");

    let id = request_id.as_str();
    let outcome = poll
        .run_until(
            |attempt| async move {
                match relay.status(id).await {
                    Ok(status) => status.poll_status(),
                    Err(e) => {
                        tracing::warn!(attempt, request_id = id, error = %e, "Status lookup failed");
                        PollStatus::Pending(None)
                    }
                }
            },
            shutdown,
        )
        .await;

    match outcome {
        PollOutcome::Completed { attempts, .. } => {
            tracing::info!(%request_id, attempts, "Bridge complete");
            Ok(BridgeOutcome::Completed { tx_hash, request_id, block_number })
        }
        PollOutcome::Failed { reason, .. } => Err(BridgeError::IntentFailed { tx_hash, request_id, reason }),
        PollOutcome::Exhausted { attempts, last_status } => {
            tracing::warn!(%request_id, attempts, ?last_status, "Bridge still pending, check manually");
            Ok(BridgeOutcome::Pending { tx_hash, request_id, last_status })
        }
        PollOutcome::Interrupted { .. } => Ok(BridgeOutcome::Interrupted { tx_hash, request_id }),
    }
}

/// Bridge from the chain `chain` is connected to.
#[derive(Debug)]
pub struct RelayBridge {
    relay: RelayClient,
    chain: BlockchainClient,
    user: Address,
    config: BridgeConfig,
    poll: BoundedPoll,
    receipt_interval: Duration,
}

impl RelayBridge {
    pub fn new(
        relay: RelayClient,
        chain: BlockchainClient,
        user: Address,
        config: &BridgeConfig,
        timing: &TimingConfig,
    ) -> Self {
        Self {
            relay,
            chain,
            user,
            config: config.clone(),
            poll: BoundedPoll::from_timing(timing),
            receipt_interval: RECEIPT_POLL_INTERVAL,
        }
    }

    pub fn with_poll(mut self, poll: BoundedPoll) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_receipt_interval(mut self, interval: Duration) -> Self {
        self.receipt_interval = interval;
        self
    }

    /// Move `amount` wei of native currency to `destination_chain_id`.
    pub async fn bridge(
        &self,
        amount: U256,
        destination_chain_id: u64,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<BridgeOutcome, BridgeError> {
        let origin_chain_id = self.chain.endpoint().chain_id;
        if amount.is_zero() {
            return Err(BridgeError::InvalidRequest("amount must be greater than zero".to_string()));
        }
        if origin_chain_id == destination_chain_id {
            return Err(BridgeError::InvalidRequest(format!(
                "origin and destination are both chain {}",
                origin_chain_id
            )));
        }

        self.chain.verify_chain_id().await?;
        let balance = self.chain.get_balance(self.user).await?;
        if balance < amount {
            return Err(BridgeError::InsufficientFunds { have: balance, need: amount });
        }

        tracing::info!(
            user = %self.user,
            %amount,
            origin_chain_id,
            destination_chain_id,
            "Requesting quote"
        );
        let quote = self
            .relay
            .quote(&QuoteRequest::native(self.user, amount, origin_chain_id, destination_chain_id))
            .await?;
        tracing::info!(
            amount_in = ?quote.amount_in(),
            amount_out = ?quote.amount_out(),
            relayer_fee = ?quote.relayer_fee(),
            "Quote received"
        );

        let plan = quote.plan()?;
        let tx = plan
            .call
            .clone()
            .into_request(self.config.fee_multiplier, self.config.gas_limit);
        let tx_hash = self.chain.send_transaction(tx).await?;
        tracing::info!(%tx_hash, request_id = %plan.request_id, "Bridge transaction sent");

        let request_id = plan.request_id;
        let mined = tokio::select! {
            biased;
            _ = wait_for_shutdown(Some(&mut *shutdown)) => {
                tracing::info!(%tx_hash, %request_id, "Interrupted while waiting for receipt");
                return Ok(BridgeOutcome::Interrupted { tx_hash, request_id });
            }
            mined = wait_for_receipt(&self.chain, tx_hash, self.config.receipt_timeout_secs, self.receipt_interval) => mined,
        };
        let mined = match mined {
            Ok(mined) => mined,
            Err(BlockchainError::ReceiptTimeout { secs, .. }) => {
                tracing::warn!(%tx_hash, %request_id, secs, "No receipt yet, check manually");
                return Ok(BridgeOutcome::Pending {
                    tx_hash,
                    request_id,
                    last_status: Some(format!("no receipt after {}s", secs)),
                });
            }
            Err(source) => return Err(BridgeError::Unconfirmed { tx_hash, request_id, source }),
        };
        tracing::info!(%tx_hash, block = ?mined.block_number, "Bridge transaction confirmed");

        await_intent(&self.relay, &self.poll, tx_hash, request_id, mined.block_number, shutdown).await
    }
}

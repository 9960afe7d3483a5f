//! Relay.link request and response types.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

use crate::blockchain::{BlockchainError, QuotedCall};
use crate::http::RemoteError;
use crate::publish::PollStatus;

/// Native currency on every chain, as Relay spells it.
pub const NATIVE_CURRENCY: Address = Address::ZERO;

/// Errors from the bridge flow.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Bad amount or chain selection, detected before any network call.
    #[error("invalid bridge request: {0}")]
    InvalidRequest(String),

    /// Relay returned an error document instead of a quote.
    #[error("quote failed (status {status}): {body}")]
    QuoteRejected { status: u16, body: String },

    /// The quote lacks a field needed to build the deposit.
    #[error("quote is missing {0}")]
    MalformedQuote(String),

    #[error("insufficient balance: have {have} wei, need {need} wei")]
    InsufficientFunds { have: U256, need: U256 },

    /// Relay reported the intent as failed.
    #[error("bridge failed for request {request_id} (tx {tx_hash}): {reason}")]
    IntentFailed {
        tx_hash: TxHash,
        request_id: String,
        reason: String,
    },

    /// The deposit was broadcast but its receipt could not be confirmed.
    #[error("transaction {tx_hash} for request {request_id} not confirmed: {source}")]
    Unconfirmed {
        tx_hash: TxHash,
        request_id: String,
        #[source]
        source: BlockchainError,
    },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Chain(#[from] BlockchainError),
}

impl BridgeError {
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}

/// Body of `POST /quote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub user: Address,
    pub origin_chain_id: u64,
    pub destination_chain_id: u64,
    pub origin_currency: Address,
    pub destination_currency: Address,
    /// Wei, decimal.
    pub amount: String,
    pub trade_type: &'static str,
}

impl QuoteRequest {
    /// Native-to-native transfer of exactly `amount` wei.
    pub fn native(user: Address, amount: U256, origin_chain_id: u64, destination_chain_id: u64) -> Self {
        Self {
            user,
            origin_chain_id,
            destination_chain_id,
            origin_currency: NATIVE_CURRENCY,
            destination_currency: NATIVE_CURRENCY,
            amount: amount.to_string(),
            trade_type: "EXACT_INPUT",
        }
    }
}

/// An integer Relay sends either as a JSON number or a decimal/hex string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(u64),
    Text(String),
}

impl Quantity {
    pub fn to_u256(&self) -> Result<U256, String> {
        match self {
            Quantity::Number(n) => Ok(U256::from(*n)),
            Quantity::Text(s) => U256::from_str(s.trim()).map_err(|e| format!("'{}': {}", s, e)),
        }
    }

    pub fn to_u128(&self) -> Result<u128, String> {
        let value = self.to_u256()?;
        u128::try_from(value).map_err(|_| format!("{} does not fit in 128 bits", value))
    }
}

/// Transaction parameters of a quote step item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTransaction {
    pub to: Address,
    #[serde(default)]
    pub data: Bytes,
    pub value: Quantity,
    pub max_fee_per_gas: Quantity,
    pub max_priority_fee_per_gas: Quantity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepItem {
    pub data: StepTransaction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub items: Vec<StepItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyAmount {
    pub amount: Quantity,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetails {
    pub currency_in: Option<CurrencyAmount>,
    pub currency_out: Option<CurrencyAmount>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    #[serde(default)]
    pub amount_formatted: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Fees {
    #[serde(default)]
    pub relayer: Option<Fee>,
}

/// A quote from `POST /quote`.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayQuote {
    pub steps: Vec<Step>,
    #[serde(default)]
    pub details: Option<QuoteDetails>,
    #[serde(default)]
    pub fees: Option<Fees>,
}

impl RelayQuote {
    /// Parse a quote document.
    ///
    /// A body carrying `message`, or without `steps`, is an error document
    /// whatever the status code.
    pub fn from_response(status: u16, body: &Value) -> Result<Self, BridgeError> {
        let rejected = || BridgeError::QuoteRejected {
            status,
            body: body.to_string(),
        };
        if body.get("message").is_some() || body.get("steps").is_none() || !(200..300).contains(&status) {
            return Err(rejected());
        }
        serde_json::from_value(body.clone()).map_err(|e| BridgeError::MalformedQuote(e.to_string()))
    }

    /// Deposit call and request id from the first step.
    pub fn plan(&self) -> Result<DepositPlan, BridgeError> {
        let step = self
            .steps
            .first()
            .ok_or_else(|| BridgeError::MalformedQuote("steps[0]".to_string()))?;
        let item = step
            .items
            .first()
            .ok_or_else(|| BridgeError::MalformedQuote("steps[0].items[0]".to_string()))?;
        let request_id = step
            .request_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| BridgeError::MalformedQuote("steps[0].requestId".to_string()))?;

        let tx = &item.data;
        let malformed = |field: &str, e: String| BridgeError::MalformedQuote(format!("{} ({})", field, e));
        let call = QuotedCall {
            to: tx.to,
            data: tx.data.clone(),
            value: tx.value.to_u256().map_err(|e| malformed("value", e))?,
            max_fee_per_gas: tx.max_fee_per_gas.to_u128().map_err(|e| malformed("maxFeePerGas", e))?,
            max_priority_fee_per_gas: tx
                .max_priority_fee_per_gas
                .to_u128()
                .map_err(|e| malformed("maxPriorityFeePerGas", e))?,
        };

        Ok(DepositPlan { call, request_id })
    }

    pub fn amount_in(&self) -> Option<U256> {
        self.details.as_ref()?.currency_in.as_ref()?.amount.to_u256().ok()
    }

    pub fn amount_out(&self) -> Option<U256> {
        self.details.as_ref()?.currency_out.as_ref()?.amount.to_u256().ok()
    }

    pub fn relayer_fee(&self) -> Option<&str> {
        self.fees.as_ref()?.relayer.as_ref()?.amount_formatted.as_deref()
    }
}

/// What to send and what to poll for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositPlan {
    pub call: QuotedCall,
    pub request_id: String,
}

/// `GET /intents/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

impl IntentStatus {
    /// `success` completes, `failed` fails, anything else is pending.
    pub fn poll_status(&self) -> PollStatus<()> {
        match self.status.as_deref() {
            Some("success") => PollStatus::Done(()),
            Some("failed") => PollStatus::Failed(self.render()),
            other => PollStatus::Pending(Some(other.unwrap_or("pending").to_string())),
        }
    }

    fn render(&self) -> String {
        let mut doc = self.other.clone();
        if let Some(status) = &self.status {
            doc.insert("status".to_string(), Value::String(status.clone()));
        }
        Value::Object(doc).to_string()
    }
}

/// How a bridge run ended, short of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeOutcome {
    Completed {
        tx_hash: TxHash,
        request_id: String,
        block_number: Option<u64>,
    },
    /// No receipt within the deadline, or the status poll cap was reached.
    /// Check the request id later.
    Pending {
        tx_hash: TxHash,
        request_id: String,
        last_status: Option<String>,
    },
    /// Shutdown arrived after the broadcast, before the intent settled.
    Interrupted { tx_hash: TxHash, request_id: String },
}

impl BridgeOutcome {
    pub fn tx_hash(&self) -> TxHash {
        match self {
            BridgeOutcome::Completed { tx_hash, .. }
            | BridgeOutcome::Pending { tx_hash, .. }
            | BridgeOutcome::Interrupted { tx_hash, .. } => *tx_hash,
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            BridgeOutcome::Completed { request_id, .. }
            | BridgeOutcome::Pending { request_id, .. }
            | BridgeOutcome::Interrupted { request_id, .. } => request_id,
        }
    }
}

//! Cross-chain bridging via Relay.link.
//!
//! # Data Flow
//! ```text
//! amount, origin chain, destination chain
//!     → balance + chain id checks (blockchain client)
//!     → POST /quote            (relay.rs)
//!     → DepositPlan            (types.rs: steps[0].items[0].data, requestId)
//!     → wallet-signed tx, fees × multiplier, fixed gas limit
//!     → wait_for_receipt
//!     → BoundedPoll over GET /intents/status (flow.rs)
//!     → BridgeOutcome::{Completed, Pending, Interrupted} | BridgeError
//! ```

pub mod flow;
pub mod relay;
pub mod types;

pub use flow::{await_intent, RelayBridge};
pub use relay::RelayClient;
pub use types::{BridgeError, BridgeOutcome, DepositPlan, IntentStatus, QuoteRequest, RelayQuote};

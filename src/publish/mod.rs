//! Signed publishing with verification.
//!
//! # Data Flow
//! ```text
//! OutboundMessage (content, destination, idempotency key)
//!     → validate (config errors, no network)
//!     → signer domain check
//!     → RemoteService::resolve      (unknown destination stops here)
//!     → RemoteService::draft
//!     → MessageSigner::sign         (failure stops here)
//!     → RemoteService::submit       (sent once, rejection surfaced verbatim)
//!     → verify delay
//!     → RemoteService::lookup       (absent or failing ⇒ verified=false)
//!     → SubmissionResult
//! ```
//!
//! `poll.rs` holds the bounded loop used where one re-query is not enough.
//!
//! # Design Decisions
//! - Nothing here retries; the idempotency key makes caller retries safe
//! - Verification only raises confidence and never turns into an error
//! - The loop always terminates: cap, terminal status or shutdown

pub mod error;
pub mod flow;
pub mod poll;
pub mod types;

pub use error::{PublishError, PublishResult};
pub use flow::{Publisher, RemoteService};
pub use poll::{BoundedPoll, PollOutcome, PollStatus};
pub use types::{
    Destination, IdempotencyKey, Mention, OutboundMessage, Receipt, ResolvedDestination, SubmissionResult,
    SubmissionStatus,
};

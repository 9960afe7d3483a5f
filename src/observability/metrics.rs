//! Counters for publish, verification and polling.
//!
//! # Metrics
//! - `agent_submissions_total` (counter): submissions by service, outcome
//!   (`accepted`, `pending_unknown`, `rejected`)
//! - `agent_verifications_total` (counter): verification lookups by service,
//!   verified (`true`/`false`)
//! - `agent_poll_attempts_total` (counter): poll queries by outcome
//!   (`done`, `failed`, `pending`)
//!
//! Recorded through the `metrics` facade. Without an installed recorder these
//! are no-ops; an embedding application installs one if it wants them.

pub const SUBMISSIONS_TOTAL: &str = "agent_submissions_total";
pub const VERIFICATIONS_TOTAL: &str = "agent_verifications_total";
pub const POLL_ATTEMPTS_TOTAL: &str = "agent_poll_attempts_total";

/// Record a submission result.
pub fn record_submission(service: &'static str, outcome: &'static str) {
    ::metrics::counter!(SUBMISSIONS_TOTAL, "service" => service, "outcome" => outcome).increment(1);
}

/// Record a verification lookup.
pub fn record_verification(service: &'static str, verified: bool) {
    let verified = if verified { "true" } else { "false" };
    ::metrics::counter!(VERIFICATIONS_TOTAL, "service" => service, "verified" => verified).increment(1);
}

/// Record one poll query.
pub fn record_poll_attempt(outcome: &'static str) {
    ::metrics::counter!(POLL_ATTEMPTS_TOTAL, "outcome" => outcome).increment(1);
}

//! What commands print.
//!
//! Human-readable lines and JSON go to stdout; errors, guidance and raw
//! debug bodies go to stderr.

use serde::Serialize;

use crate::bridge::BridgeOutcome;
use crate::error::{AgentError, AgentResult};
use crate::farcaster::cast_url;
use crate::http::ResponseBody;
use crate::publish::{IdempotencyKey, SubmissionResult, SubmissionStatus};

pub fn print_json<T: Serialize>(value: &T) -> AgentResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Dump a raw response body when debug output is on.
pub fn debug_raw(enabled: bool, raw: &ResponseBody) {
    if enabled {
        eprintln!("\n[DEBUG] Raw response:\n{}", raw.render());
    }
}

pub fn report_error(err: &AgentError) {
    eprintln!("Error: {}", err);
    if let Some(guidance) = err.guidance() {
        eprintln!("\n{}", guidance);
    }
}

/// JSON shape of a published cast.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastReport {
    pub hash: String,
    pub status: SubmissionStatus,
    pub verified: bool,
    pub idempotency_key: IdempotencyKey,
    pub parent_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub cast_url: String,
}

impl From<&SubmissionResult> for CastReport {
    fn from(result: &SubmissionResult) -> Self {
        Self {
            hash: result.id.clone(),
            status: result.status,
            verified: result.verified,
            idempotency_key: result.idempotency_key,
            parent_url: result.target.target.clone(),
            label: result.target.label.clone(),
            cast_url: cast_url(&result.id),
        }
    }
}

pub fn print_cast(result: &SubmissionResult) -> AgentResult<()> {
    let report = CastReport::from(result);
    println!("Cast published: {}", report.hash);
    if !report.verified {
        println!("Not yet visible on the hub; it may still be propagating.");
    }
    print_json(&report)
}

/// JSON shape of a sent direct cast.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectCastReport {
    pub id: String,
    pub status: SubmissionStatus,
    pub recipient: String,
    pub idempotency_key: IdempotencyKey,
}

impl From<&SubmissionResult> for DirectCastReport {
    fn from(result: &SubmissionResult) -> Self {
        Self {
            id: result.id.clone(),
            status: result.status,
            recipient: result.target.target.clone(),
            idempotency_key: result.idempotency_key,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum BridgeReport {
    Completed {
        tx_hash: String,
        request_id: String,
        block_number: Option<u64>,
    },
    Pending {
        tx_hash: String,
        request_id: String,
        last_status: Option<String>,
    },
    Interrupted {
        tx_hash: String,
        request_id: String,
    },
}

impl From<&BridgeOutcome> for BridgeReport {
    fn from(outcome: &BridgeOutcome) -> Self {
        let tx_hash = outcome.tx_hash().to_string();
        let request_id = outcome.request_id().to_string();
        match outcome {
            BridgeOutcome::Completed { block_number, .. } => Self::Completed {
                tx_hash,
                request_id,
                block_number: *block_number,
            },
            BridgeOutcome::Pending { last_status, .. } => Self::Pending {
                tx_hash,
                request_id,
                last_status: last_status.clone(),
            },
            BridgeOutcome::Interrupted { .. } => Self::Interrupted { tx_hash, request_id },
        }
    }
}

pub fn print_bridge(outcome: &BridgeOutcome) -> AgentResult<()> {
    match outcome {
        BridgeOutcome::Completed { .. } => println!("Bridge complete."),
        BridgeOutcome::Pending { .. } => {
            println!("Bridge still pending. Check later with the request id below.")
        }
        BridgeOutcome::Interrupted { .. } => {
            println!("Stopped waiting. The deposit was sent; check later with the request id below.")
        }
    }
    print_json(&BridgeReport::from(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::{Destination, ResolvedDestination};
    use alloy::primitives::TxHash;
    use serde_json::json;

    #[test]
    fn test_cast_report_shape() {
        let key: IdempotencyKey = "6f9619ff-8b86-4d01-b42d-00cf4fc964ff".parse().unwrap();
        let result = SubmissionResult {
            id: "0xabc".to_string(),
            status: SubmissionStatus::Accepted,
            verified: true,
            idempotency_key: key,
            target: ResolvedDestination {
                destination: Destination::Channel("memes".to_string()),
                target: "chain://eip155:1/erc721:0xfd8427165df67df6d7fd689ae67c8ebf56d9ca61".to_string(),
                label: None,
            },
        };
        let value = serde_json::to_value(CastReport::from(&result)).unwrap();
        assert_eq!(value["hash"], "0xabc");
        assert_eq!(value["status"], "accepted");
        assert_eq!(value["verified"], true);
        assert_eq!(value["idempotencyKey"], "6f9619ff-8b86-4d01-b42d-00cf4fc964ff");
        assert_eq!(value["castUrl"], "https://warpcast.com/~/conversations/0xabc");
        assert!(value.get("label").is_none());
    }

    #[test]
    fn test_bridge_report_is_tagged() {
        let outcome = BridgeOutcome::Pending {
            tx_hash: TxHash::ZERO,
            request_id: "0xreq".to_string(),
            last_status: Some("waiting".to_string()),
        };
        let value = serde_json::to_value(BridgeReport::from(&outcome)).unwrap();
        assert_eq!(value["state"], "pending");
        assert_eq!(value["requestId"], "0xreq");
        assert_eq!(value["lastStatus"], json!("waiting"));
    }
}

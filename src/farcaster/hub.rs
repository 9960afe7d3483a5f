//! Casting through a Farcaster hub's HTTP API.
//!
//! # Responsibilities
//! - Resolve channel and group destinations to cast parent URLs
//! - Build the `CAST_ADD` envelope and submit it as protobuf bytes
//! - Look casts up by `(fid, hash)` for verification
//!
//! # Design Decisions
//! - The cast hash is the service id; it is derived from the message value,
//!   so a retried message re-submits the identical cast and the hub keeps one
//! - Group lookup is informational; a failed lookup never blocks the post
//! - Only content (Ed25519) signatures are accepted

use async_trait::async_trait;
use prost::Message as _;
use serde_json::Value;

use crate::farcaster::message::CastDraft;
use crate::farcaster::neynar::NeynarClient;
use crate::http::{ApiClient, RemoteError};
use crate::publish::{
    Destination, IdempotencyKey, OutboundMessage, PublishError, PublishResult, Receipt, RemoteService,
    ResolvedDestination,
};
use crate::signing::{Signature, SigningDomain};

const SERVICE: &str = "hub";

pub fn channel_url(channel_id: &str) -> String {
    format!("https://warpcast.com/~/channel/{}", channel_id)
}

pub fn group_url(group_id: &str) -> String {
    format!("https://warpcast.com/~/group/{}", group_id)
}

pub fn cast_url(hash: &str) -> String {
    format!("https://warpcast.com/~/conversations/{}", hash)
}

/// Hub-backed [`RemoteService`] for casts.
#[derive(Debug, Clone)]
pub struct HubService {
    hub: ApiClient,
    neynar: Option<NeynarClient>,
    fid: u64,
}

impl HubService {
    /// `neynar` is needed for channel posts and optional for groups.
    pub fn new(hub: ApiClient, neynar: Option<NeynarClient>, fid: u64) -> Self {
        Self { hub, neynar, fid }
    }

    pub fn fid(&self) -> u64 {
        self.fid
    }

    /// Whether the hub has the cast `hash` from `fid`.
    pub async fn cast_exists(&self, fid: u64, hash: &str) -> Result<bool, RemoteError> {
        let response = self
            .hub
            .get("/v1/castById", &[("fid", fid.to_string()), ("hash", hash.to_string())])
            .await?;
        tracing::debug!(fid, hash, status = response.status, "Cast lookup");
        Ok(response.is_success())
    }

    async fn resolve_channel(&self, destination: &Destination, id: &str) -> PublishResult<ResolvedDestination> {
        let neynar = self
            .neynar
            .as_ref()
            .ok_or_else(|| PublishError::config("channel lookup requires NEYNAR_API_KEY"))?;

        let channel = neynar.channel(id).await?.ok_or_else(|| PublishError::Unresolved {
            destination: destination.to_string(),
            reason: format!("channel '{}' not found", id),
        })?;
        let parent_url = channel.cast_parent_url().ok_or_else(|| PublishError::Unresolved {
            destination: destination.to_string(),
            reason: format!("channel '{}' has no parent URL", id),
        })?;

        tracing::info!(channel = id, name = ?channel.name, parent_url, "Channel found");
        Ok(ResolvedDestination {
            destination: destination.clone(),
            target: parent_url.to_string(),
            label: channel.name.clone(),
        })
    }

    async fn resolve_group(&self, destination: &Destination, id: &str) -> ResolvedDestination {
        let mut label = None;
        if let Some(neynar) = &self.neynar {
            match neynar.group(id).await {
                Ok(Some(group)) => {
                    tracing::info!(group = id, name = ?group.name, "Group found");
                    label = group.name;
                }
                Ok(None) => tracing::info!(group = id, "Group info unavailable"),
                Err(e) => tracing::warn!(group = id, error = %e, "Group lookup failed"),
            }
        }
        ResolvedDestination {
            destination: destination.clone(),
            target: group_url(id),
            label,
        }
    }
}

#[async_trait]
impl RemoteService for HubService {
    type Draft = CastDraft;

    fn name(&self) -> &'static str {
        SERVICE
    }

    fn signing_domain(&self) -> SigningDomain {
        SigningDomain::Content
    }

    async fn resolve(&self, destination: &Destination) -> PublishResult<ResolvedDestination> {
        match destination {
            Destination::Channel(id) => self.resolve_channel(destination, id).await,
            Destination::Group(id) => Ok(self.resolve_group(destination, id).await),
            other => Err(PublishError::Unresolved {
                destination: other.to_string(),
                reason: "casts can only target a channel or a group".to_string(),
            }),
        }
    }

    fn draft(&self, message: &OutboundMessage, target: &ResolvedDestination) -> PublishResult<CastDraft> {
        if self.fid == 0 {
            return Err(PublishError::config("FID is required to cast"));
        }
        Ok(CastDraft::new(self.fid, message, &target.target))
    }

    fn signing_payload(&self, draft: &CastDraft) -> Vec<u8> {
        draft.hash.to_vec()
    }

    async fn submit(
        &self,
        draft: &CastDraft,
        signature: &Signature,
        idempotency_key: &IdempotencyKey,
    ) -> PublishResult<Receipt> {
        if signature.domain != SigningDomain::Content {
            return Err(PublishError::SignerMismatch {
                service: SERVICE,
                expected: SigningDomain::Content,
                actual: signature.domain,
            });
        }

        let id = draft.hash_hex();
        let bytes = draft.clone().into_envelope(signature).encode_to_vec();
        tracing::info!(hash = %id, fid = self.fid, size = bytes.len(), %idempotency_key, "Submitting cast");

        let response = self
            .hub
            .post_bytes("/v1/submitMessage", bytes, "application/octet-stream")
            .await?
            .error_for_status()?;

        let acknowledged = response
            .body
            .as_json()
            .and_then(|v| v.get("hash"))
            .and_then(Value::as_str)
            .is_some_and(|hash| hash.eq_ignore_ascii_case(&id));

        Ok(Receipt { id, acknowledged })
    }

    async fn lookup(&self, id: &str) -> Result<bool, RemoteError> {
        self.cast_exists(self.fid, id).await
    }
}

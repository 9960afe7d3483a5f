//! Warpcast direct casts (DMs).
//!
//! DMs are a Warpcast API feature, not hub messages: they are authenticated
//! with a bearer API key and carry no signature. Deduplication relies on the
//! `idempotencyKey` field.

use serde::Serialize;

use crate::farcaster::types::{ConversationResponse, InboxResponse, SendDirectCastResponse};
use crate::http::{ApiClient, RemoteError, ResponseBody};
use crate::observability::metrics;
use crate::publish::{
    Destination, IdempotencyKey, OutboundMessage, PublishError, PublishResult, ResolvedDestination,
    SubmissionResult, SubmissionStatus,
};

const SERVICE: &str = "warpcast";

/// A parsed response plus its raw body for debug output.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub parsed: T,
    pub raw: ResponseBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    recipient_fid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<&'a str>,
    message: &'a str,
    idempotency_key: IdempotencyKey,
}

/// Warpcast direct-cast API wrapper.
#[derive(Debug, Clone)]
pub struct DirectCastClient {
    api: ApiClient,
}

impl DirectCastClient {
    /// `api` should carry `Auth::Bearer` with the Warpcast API key.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Send to a user (`Destination::User`) or a conversation.
    ///
    /// The returned id is the idempotency key; Warpcast does not assign one.
    pub async fn send(&self, message: &OutboundMessage) -> PublishResult<SubmissionResult> {
        message.validate()?;

        let (body, target) = match &message.destination {
            Destination::User(fid) => (
                SendBody {
                    recipient_fid: Some(*fid),
                    conversation_id: None,
                    message: &message.content,
                    idempotency_key: message.idempotency_key,
                },
                fid.to_string(),
            ),
            Destination::Conversation(id) => (
                SendBody {
                    recipient_fid: None,
                    conversation_id: Some(id.as_str()),
                    message: &message.content,
                    idempotency_key: message.idempotency_key,
                },
                id.clone(),
            ),
            other => {
                return Err(PublishError::Unresolved {
                    destination: other.to_string(),
                    reason: "direct casts go to a user FID or a conversation id".to_string(),
                })
            }
        };

        tracing::info!(
            destination = %message.destination,
            idempotency_key = %message.idempotency_key,
            preview = %preview(&message.content, 50),
            "Sending direct cast"
        );

        let response = match self
            .api
            .send_json(reqwest::Method::PUT, "/v2/ext-send-direct-cast", &body)
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => response,
            Err(e) => {
                metrics::record_submission(SERVICE, "rejected");
                return Err(e.into());
            }
        };

        let acknowledged = response
            .json::<SendDirectCastResponse>()
            .map(|r| r.acknowledged())
            .unwrap_or(false);
        let status = if acknowledged {
            SubmissionStatus::Accepted
        } else {
            SubmissionStatus::PendingUnknown
        };
        metrics::record_submission(SERVICE, if acknowledged { "accepted" } else { "pending_unknown" });

        Ok(SubmissionResult {
            id: message.idempotency_key.to_string(),
            status,
            verified: false,
            idempotency_key: message.idempotency_key,
            target: ResolvedDestination {
                destination: message.destination.clone(),
                target,
                label: None,
            },
        })
    }

    /// List inbox conversations.
    pub async fn inbox(&self, limit: Option<u32>, cursor: Option<&str>) -> Result<Fetched<InboxResponse>, RemoteError> {
        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        let response = self.api.get("/v2/direct-cast-inbox", &query).await?.error_for_status()?;
        Ok(Fetched {
            parsed: response.json()?,
            raw: response.body,
        })
    }

    /// Read messages of one conversation.
    pub async fn conversation(
        &self,
        conversation_id: &str,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<Fetched<ConversationResponse>, RemoteError> {
        let mut query = vec![("conversationId", conversation_id.to_string())];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        let response = self
            .api
            .get("/v2/direct-cast-conversation", &query)
            .await?
            .error_for_status()?;
        Ok(Fetched {
            parsed: response.json()?,
            raw: response.body,
        })
    }
}

/// First `max` characters, with `...` when cut.
pub fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

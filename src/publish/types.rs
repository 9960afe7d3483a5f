//! Outbound messages, destinations and submission results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::publish::error::PublishError;

/// Token letting a remote service collapse duplicate writes.
///
/// Generated once per `OutboundMessage`; retrying with the same message value
/// reuses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for IdempotencyKey {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| PublishError::config(format!("invalid idempotency key '{}': {}", s, e)))
    }
}

/// Where a message is going.
///
/// Textual form is `<kind>:<id>`, e.g. `channel:memes`, `user:272109`,
/// `conversation:4508b83dfc815a01`, `address:0xabc…`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Destination {
    /// Farcaster channel id.
    Channel(String),
    /// Warpcast group id.
    Group(String),
    /// Farcaster user by FID.
    User(u64),
    /// Warpcast or XMTP conversation id.
    Conversation(String),
    /// Ethereum address (XMTP identity).
    Address(String),
}

impl Destination {
    pub fn kind(&self) -> &'static str {
        match self {
            Destination::Channel(_) => "channel",
            Destination::Group(_) => "group",
            Destination::User(_) => "user",
            Destination::Conversation(_) => "conversation",
            Destination::Address(_) => "address",
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Destination::Channel(id)
            | Destination::Group(id)
            | Destination::Conversation(id)
            | Destination::Address(id) => id.trim().is_empty(),
            Destination::User(fid) => *fid == 0,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Channel(id)
            | Destination::Group(id)
            | Destination::Conversation(id)
            | Destination::Address(id) => write!(f, "{}:{}", self.kind(), id),
            Destination::User(fid) => write!(f, "user:{}", fid),
        }
    }
}

impl FromStr for Destination {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| PublishError::config(format!("destination '{}' must look like kind:id", s)))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(PublishError::config(format!("destination '{}' has an empty id", s)));
        }
        match kind.trim().to_lowercase().as_str() {
            "channel" => Ok(Destination::Channel(id.to_string())),
            "group" => Ok(Destination::Group(id.to_string())),
            "user" | "fid" => id
                .parse()
                .map(Destination::User)
                .map_err(|_| PublishError::config(format!("'{}' is not a valid FID", id))),
            "conversation" => Ok(Destination::Conversation(id.to_string())),
            "address" => Ok(Destination::Address(id.to_string())),
            other => Err(PublishError::config(format!("unknown destination kind '{}'", other))),
        }
    }
}

/// An account mentioned inside cast text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub fid: u64,
    /// Byte offset in the text where the mention is rendered.
    pub position: u32,
}

/// Content to publish plus everything needed to retry it safely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub content: String,
    pub destination: Destination,
    pub idempotency_key: IdempotencyKey,
    /// Unix seconds; fixed at creation so a retried message signs identical bytes.
    pub created_at: u64,
    pub embeds: Vec<String>,
    pub mentions: Vec<Mention>,
}

impl OutboundMessage {
    pub fn new(content: impl Into<String>, destination: Destination) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            content: content.into(),
            destination,
            idempotency_key: IdempotencyKey::generate(),
            created_at,
            embeds: Vec::new(),
            mentions: Vec::new(),
        }
    }

    pub fn with_idempotency_key(mut self, key: IdempotencyKey) -> Self {
        self.idempotency_key = key;
        self
    }

    pub fn with_created_at(mut self, unix_secs: u64) -> Self {
        self.created_at = unix_secs;
        self
    }

    pub fn with_embeds(mut self, embeds: Vec<String>) -> Self {
        self.embeds = embeds;
        self
    }

    pub fn with_mentions(mut self, mentions: Vec<Mention>) -> Self {
        self.mentions = mentions;
        self
    }

    /// Check required identifiers before anything touches the network.
    pub fn validate(&self) -> Result<(), PublishError> {
        if self.destination.is_blank() {
            return Err(PublishError::config(format!(
                "{} destination is missing its identifier",
                self.destination.kind()
            )));
        }
        if self.content.trim().is_empty() && self.embeds.is_empty() {
            return Err(PublishError::config("message has no content"));
        }
        for mention in &self.mentions {
            if mention.position as usize > self.content.len() {
                return Err(PublishError::config(format!(
                    "mention of FID {} at {} is past the end of the text",
                    mention.fid, mention.position
                )));
            }
        }
        Ok(())
    }
}

/// A destination after lookup against the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDestination {
    pub destination: Destination,
    /// Service-level target (parent URL, recipient FID, conversation id).
    pub target: String,
    /// Display name if the lookup returned one.
    pub label: Option<String>,
}

/// What the service said when it took the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub id: String,
    /// False when the 2xx response did not carry the expected confirmation.
    pub acknowledged: bool,
}

/// Status of a submission that was not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// The service confirmed the write in its response.
    Accepted,
    /// 2xx without a recognizable confirmation; treat as unknown until verified.
    PendingUnknown,
}

/// Outcome of a submit, refined by verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub id: String,
    pub status: SubmissionStatus,
    /// Set only after a follow-up read found the item.
    pub verified: bool,
    pub idempotency_key: IdempotencyKey,
    pub target: ResolvedDestination,
}

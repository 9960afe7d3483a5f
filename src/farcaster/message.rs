//! Hub message envelope for `CAST_ADD`.
//!
//! Field layout follows the hub's protobuf schema for the subset the agent
//! submits; encoding is prost's. Enumerations and oneofs are declared as their
//! wire types (int32 / optional fields), which encode identically.

use prost::Message;

use crate::publish::OutboundMessage;
use crate::signing::Signature;

/// Farcaster epoch (2021-01-01T00:00:00Z) in Unix seconds.
pub const FARCASTER_EPOCH: u64 = 1_609_459_200;

pub const MESSAGE_TYPE_CAST_ADD: i32 = 1;
pub const NETWORK_MAINNET: i32 = 1;
pub const HASH_SCHEME_BLAKE3: i32 = 1;
pub const SIGNATURE_SCHEME_ED25519: i32 = 1;

/// Hash length used by hubs (truncated BLAKE3).
pub const HASH_LEN: usize = 20;

#[derive(Clone, PartialEq, Message)]
pub struct Embed {
    #[prost(string, optional, tag = "1")]
    pub url: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CastAddBody {
    #[prost(string, repeated, tag = "1")]
    pub embeds_deprecated: Vec<String>,
    #[prost(uint64, repeated, tag = "2")]
    pub mentions: Vec<u64>,
    #[prost(string, tag = "4")]
    pub text: String,
    #[prost(uint32, repeated, tag = "5")]
    pub mentions_positions: Vec<u32>,
    #[prost(message, repeated, tag = "6")]
    pub embeds: Vec<Embed>,
    #[prost(string, optional, tag = "7")]
    pub parent_url: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct MessageData {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(uint64, tag = "2")]
    pub fid: u64,
    /// Seconds since [`FARCASTER_EPOCH`].
    #[prost(uint32, tag = "3")]
    pub timestamp: u32,
    #[prost(int32, tag = "4")]
    pub network: i32,
    #[prost(message, optional, tag = "5")]
    pub cast_add_body: Option<CastAddBody>,
}

#[derive(Clone, PartialEq, Message)]
pub struct HubMessage {
    #[prost(message, optional, tag = "1")]
    pub data: Option<MessageData>,
    #[prost(bytes = "vec", tag = "2")]
    pub hash: Vec<u8>,
    #[prost(int32, tag = "3")]
    pub hash_scheme: i32,
    #[prost(bytes = "vec", tag = "4")]
    pub signature: Vec<u8>,
    #[prost(int32, tag = "5")]
    pub signature_scheme: i32,
    #[prost(bytes = "vec", tag = "6")]
    pub signer: Vec<u8>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub data_bytes: Option<Vec<u8>>,
}

/// Convert Unix seconds to a hub timestamp. Times before the epoch clamp to 0.
pub fn farcaster_timestamp(unix_secs: u64) -> u32 {
    let secs = unix_secs.saturating_sub(FARCASTER_EPOCH);
    u32::try_from(secs).unwrap_or(u32::MAX)
}

/// BLAKE3 of the encoded data, truncated to 20 bytes.
pub fn message_hash(data_bytes: &[u8]) -> [u8; HASH_LEN] {
    let digest = blake3::hash(data_bytes);
    let mut hash = [0u8; HASH_LEN];
    hash.copy_from_slice(&digest.as_bytes()[..HASH_LEN]);
    hash
}

/// `0x`-prefixed lowercase hex, the form hubs and Warpcast URLs use.
pub fn hash_hex(hash: &[u8]) -> String {
    format!("0x{}", hex::encode(hash))
}

/// An encoded, hashed `CAST_ADD` waiting for its signature.
#[derive(Debug, Clone, PartialEq)]
pub struct CastDraft {
    pub data: MessageData,
    pub data_bytes: Vec<u8>,
    pub hash: [u8; HASH_LEN],
}

impl CastDraft {
    /// Build the cast for `message` under `parent_url`.
    ///
    /// Everything comes from the message value, so a retried message yields
    /// the same bytes and the same hash.
    pub fn new(fid: u64, message: &OutboundMessage, parent_url: &str) -> Self {
        let body = CastAddBody {
            embeds_deprecated: Vec::new(),
            mentions: message.mentions.iter().map(|m| m.fid).collect(),
            text: message.content.clone(),
            mentions_positions: message.mentions.iter().map(|m| m.position).collect(),
            embeds: message
                .embeds
                .iter()
                .map(|url| Embed { url: Some(url.clone()) })
                .collect(),
            parent_url: Some(parent_url.to_string()),
        };
        let data = MessageData {
            r#type: MESSAGE_TYPE_CAST_ADD,
            fid,
            timestamp: farcaster_timestamp(message.created_at),
            network: NETWORK_MAINNET,
            cast_add_body: Some(body),
        };
        let data_bytes = data.encode_to_vec();
        let hash = message_hash(&data_bytes);
        Self { data, data_bytes, hash }
    }

    pub fn hash_hex(&self) -> String {
        hash_hex(&self.hash)
    }

    /// Attach a content signature and encode the full envelope.
    pub fn into_envelope(self, signature: &Signature) -> HubMessage {
        HubMessage {
            data: Some(self.data),
            hash: self.hash.to_vec(),
            hash_scheme: HASH_SCHEME_BLAKE3,
            signature: signature.bytes.clone(),
            signature_scheme: SIGNATURE_SCHEME_ED25519,
            signer: signature.signer.clone(),
            data_bytes: Some(self.data_bytes),
        }
    }
}

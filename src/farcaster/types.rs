//! Response shapes of the Neynar and Warpcast endpoints the agent reads.
//!
//! Several Warpcast responses nest their payload under `result` on some
//! deployments and return it at the top level on others. Those are parsed
//! into an envelope with both slots and resolved by an explicit rule, see
//! [`InboxResponse::conversations`] and [`ConversationResponse::messages`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Farcaster channel as Neynar returns it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub parent_url: Option<String>,
    #[serde(default)]
    pub follower_count: Option<u64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Channel {
    /// Parent URL casts must carry: `parent_url`, else `url`.
    pub fn cast_parent_url(&self) -> Option<&str> {
        self.parent_url
            .as_deref()
            .or(self.url.as_deref())
            .filter(|u| !u.is_empty())
    }
}

/// `GET /v2/farcaster/channel`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelResponse {
    #[serde(default)]
    pub channel: Option<Channel>,
}

/// `GET /v2/farcaster/channel/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSearchResponse {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// A Warpcast group. Only the name and description are relied on.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Group {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// `GET /v2/farcaster/group`.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupResponse {
    #[serde(default)]
    pub group: Option<Group>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CastAuthor {
    pub fid: u64,
    #[serde(default)]
    pub username: Option<String>,
}

/// A cast from a feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeedCast {
    pub hash: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: Option<CastAuthor>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// `GET /v2/farcaster/group/feed`.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupFeedResponse {
    #[serde(default)]
    pub casts: Vec<FeedCast>,
}

/// Who sits in a direct-cast conversation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Participant {
    #[serde(default)]
    pub fid: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
}

/// A direct-cast message.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    #[serde(default)]
    pub text: Option<String>,
    /// Older responses carry the body here instead of `text`.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub author: Option<Participant>,
    #[serde(default)]
    pub sender_fid: Option<u64>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl DirectMessage {
    /// Body text: `text`, else `message`.
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().or(self.message.as_deref())
    }

    /// Sender label: author username, else sender fid, else `Unknown`.
    pub fn sender(&self) -> String {
        if let Some(username) = self.author.as_ref().and_then(|a| a.username.as_deref()) {
            return username.to_string();
        }
        match self.sender_fid {
            Some(fid) => fid.to_string(),
            None => "Unknown".to_string(),
        }
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }
}

/// A direct-cast conversation in the inbox.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Older responses use `id`.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub last_message: Option<DirectMessage>,
    #[serde(default)]
    pub unread_count: u64,
}

impl Conversation {
    /// Identifier: `conversationId`, else `id`.
    pub fn identifier(&self) -> Option<&str> {
        self.conversation_id.as_deref().or(self.id.as_deref())
    }
}

/// Pagination cursor as the inbox endpoints return it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Next {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboxPayload {
    #[serde(default)]
    pub conversations: Option<Vec<Conversation>>,
}

/// `GET /v2/direct-cast-inbox`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboxResponse {
    #[serde(default)]
    pub result: Option<InboxPayload>,
    #[serde(default)]
    pub conversations: Option<Vec<Conversation>>,
    #[serde(default)]
    pub next: Option<Next>,
}

impl InboxResponse {
    /// `result.conversations`, else top-level `conversations`, else empty.
    pub fn conversations(&self) -> &[Conversation] {
        self.result
            .as_ref()
            .and_then(|r| r.conversations.as_deref())
            .or(self.conversations.as_deref())
            .unwrap_or(&[])
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next.as_ref().and_then(|n| n.cursor.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationPayload {
    #[serde(default)]
    pub messages: Option<Vec<DirectMessage>>,
}

/// `GET /v2/direct-cast-conversation`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationResponse {
    #[serde(default)]
    pub result: Option<ConversationPayload>,
    #[serde(default)]
    pub messages: Option<Vec<DirectMessage>>,
    #[serde(default)]
    pub next: Option<Next>,
}

impl ConversationResponse {
    /// `result.messages`, else top-level `messages`, else empty.
    pub fn messages(&self) -> &[DirectMessage] {
        self.result
            .as_ref()
            .and_then(|r| r.messages.as_deref())
            .or(self.messages.as_deref())
            .unwrap_or(&[])
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next.as_ref().and_then(|n| n.cursor.as_deref())
    }
}

/// `PUT /v2/ext-send-direct-cast` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendDirectCastResponse {
    #[serde(default)]
    pub result: Option<SendDirectCastResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendDirectCastResult {
    #[serde(default)]
    pub success: bool,
}

impl SendDirectCastResponse {
    pub fn acknowledged(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_parent_url_fallback() {
        let channel: Channel = serde_json::from_value(json!({
            "id": "memes",
            "url": "https://warpcast.com/~/channel/memes"
        }))
        .unwrap();
        assert_eq!(channel.cast_parent_url(), Some("https://warpcast.com/~/channel/memes"));

        let channel: Channel = serde_json::from_value(json!({
            "id": "memes",
            "url": "https://warpcast.com/~/channel/memes",
            "parent_url": "chain://eip155:1/erc721:0xfd8427165df67df6d7fd689ae67c8ebf56d9ca61"
        }))
        .unwrap();
        assert!(channel.cast_parent_url().unwrap().starts_with("chain://"));

        let channel: Channel = serde_json::from_value(json!({ "id": "bare" })).unwrap();
        assert_eq!(channel.cast_parent_url(), None);
    }

    #[test]
    fn test_inbox_prefers_result_envelope() {
        let nested: InboxResponse = serde_json::from_value(json!({
            "result": { "conversations": [{ "conversationId": "a" }] },
            "conversations": [{ "conversationId": "b" }, { "conversationId": "c" }]
        }))
        .unwrap();
        assert_eq!(nested.conversations().len(), 1);
        assert_eq!(nested.conversations()[0].identifier(), Some("a"));

        let flat: InboxResponse = serde_json::from_value(json!({
            "conversations": [{ "id": "legacy" }],
            "next": { "cursor": "abc" }
        }))
        .unwrap();
        assert_eq!(flat.conversations()[0].identifier(), Some("legacy"));
        assert_eq!(flat.next_cursor(), Some("abc"));

        let empty: InboxResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.conversations().is_empty());
    }

    #[test]
    fn test_direct_message_fallbacks() {
        let messages: ConversationResponse = serde_json::from_value(json!({
            "messages": [
                { "text": "hi", "author": { "fid": 3, "username": "dwr" }, "timestamp": 1700000000000i64 },
                { "message": "legacy body", "senderFid": 272109 },
                {}
            ]
        }))
        .unwrap();
        let messages = messages.messages();

        assert_eq!(messages[0].body(), Some("hi"));
        assert_eq!(messages[0].sender(), "dwr");
        assert!(messages[0].sent_at().is_some());
        assert_eq!(messages[1].body(), Some("legacy body"));
        assert_eq!(messages[1].sender(), "272109");
        assert_eq!(messages[2].sender(), "Unknown");
        assert_eq!(messages[2].body(), None);
    }

    #[test]
    fn test_send_acknowledgement() {
        let ok: SendDirectCastResponse = serde_json::from_value(json!({ "result": { "success": true } })).unwrap();
        assert!(ok.acknowledged());
        let unknown: SendDirectCastResponse = serde_json::from_value(json!({ "ok": 1 })).unwrap();
        assert!(!unknown.acknowledged());
    }
}

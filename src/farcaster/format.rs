//! Terminal presentation of inbox data.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::farcaster::types::{Conversation, DirectMessage, FeedCast, Participant};
use crate::farcaster::warpcast::preview;

pub fn format_time(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "Unknown".to_string(),
    }
}

fn participant_label(p: &Participant) -> String {
    match (&p.username, p.fid) {
        (Some(username), _) => format!("@{}", username),
        (None, Some(fid)) => format!("@{}", fid),
        (None, None) => "@Unknown".to_string(),
    }
}

/// One inbox row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: String,
    pub participants: String,
    pub last_message: String,
    pub time: String,
    pub unread: u64,
}

impl From<&Conversation> for ConversationSummary {
    fn from(conv: &Conversation) -> Self {
        let participants = if conv.participants.is_empty() {
            "Unknown".to_string()
        } else {
            conv.participants
                .iter()
                .map(participant_label)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let last = conv.last_message.as_ref();
        Self {
            id: conv.identifier().unwrap_or("unknown").to_string(),
            participants,
            last_message: last.and_then(DirectMessage::body).map(|t| preview(t, 50)).unwrap_or_default(),
            time: format_time(last.and_then(DirectMessage::sent_at)),
            unread: conv.unread_count,
        }
    }
}

impl fmt::Display for ConversationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.id)?;
        writeln!(f, "   Participants: {}", self.participants)?;
        writeln!(f, "   Last: \"{}\"", self.last_message)?;
        writeln!(f, "   Time: {}", self.time)?;
        write!(f, "   Unread: {}", self.unread)
    }
}

/// One message row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLine {
    pub from: String,
    pub text: String,
    pub time: String,
}

impl From<&DirectMessage> for MessageLine {
    fn from(msg: &DirectMessage) -> Self {
        Self {
            from: format!("@{}", msg.sender()),
            text: msg.body().unwrap_or_default().to_string(),
            time: format_time(msg.sent_at()),
        }
    }
}

impl fmt::Display for MessageLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.from, self.time)?;
        write!(f, "   {}", self.text)
    }
}

/// A feed cast as a single block.
pub fn format_feed_cast(cast: &FeedCast) -> String {
    let author = cast
        .author
        .as_ref()
        .map(|a| match &a.username {
            Some(username) => format!("@{}", username),
            None => format!("fid:{}", a.fid),
        })
        .unwrap_or_else(|| "@Unknown".to_string());
    format!("{} ({})\n   {}\n   {}", author, format_time(cast.timestamp), cast.text, cast.hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversation_summary() {
        let conv: Conversation = serde_json::from_value(json!({
            "conversationId": "4508b83dfc815a01",
            "participants": [{ "fid": 3, "username": "dwr" }, { "fid": 272109 }],
            "lastMessage": { "text": "x".repeat(60), "timestamp": 0 },
            "unreadCount": 2
        }))
        .unwrap();
        let summary = ConversationSummary::from(&conv);

        assert_eq!(summary.id, "4508b83dfc815a01");
        assert_eq!(summary.participants, "@dwr, @272109");
        assert_eq!(summary.last_message, format!("{}...", "x".repeat(50)));
        assert_eq!(summary.time, "1970-01-01 00:00:00 UTC");
        assert_eq!(summary.unread, 2);
        assert!(summary.to_string().starts_with("[4508b83dfc815a01]\n"));
    }

    #[test]
    fn test_empty_conversation_summary() {
        let conv: Conversation = serde_json::from_value(json!({ "id": "x" })).unwrap();
        let summary = ConversationSummary::from(&conv);
        assert_eq!(summary.participants, "Unknown");
        assert_eq!(summary.last_message, "");
        assert_eq!(summary.time, "Unknown");
        assert_eq!(summary.unread, 0);
    }

    #[test]
    fn test_message_line() {
        let msg: DirectMessage = serde_json::from_value(json!({ "message": "gm", "senderFid": 9 })).unwrap();
        let line = MessageLine::from(&msg);
        assert_eq!(line.from, "@9");
        assert_eq!(line.text, "gm");
        assert_eq!(line.to_string(), "@9 (Unknown)\n   gm");
    }
}

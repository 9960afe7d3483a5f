//! Account-level messaging operations over any `MessagingTransport`.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::lifecycle::wait_for_shutdown;
use crate::messaging::subscription::Subscription;
use crate::messaging::transport::{
    normalize_address, ConversationKind, GroupOptions, MessagingError, MessagingResult, MessagingTransport,
    ReceivedMessage, VISIBLE_CONSENT,
};

pub const DEFAULT_READ_LIMIT: usize = 20;
const UNNAMED_GROUP: &str = "Unnamed Group";
const UNNAMED: &str = "Unnamed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub conversation_id: String,
    pub message_id: String,
    /// Address for DMs, group id for groups.
    pub recipient: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedGroup {
    pub group_id: String,
    pub name: String,
    pub members: Vec<String>,
    pub unreachable: Vec<String>,
    pub welcome_sent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationListing {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    pub name: String,
    pub member_count: usize,
}

#[derive(Debug)]
pub struct Messenger<T> {
    transport: T,
}

impl<T: MessagingTransport> Messenger<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether `address` can receive messages.
    pub async fn check(&self, address: &str) -> MessagingResult<bool> {
        let address = normalize_address(address)?;
        let reach = self.transport.can_message(std::slice::from_ref(&address)).await?;
        Ok(reach.get(&address).copied().unwrap_or(false))
    }

    /// Send `text` to `address`, reusing an existing DM when there is one.
    pub async fn send_dm(&self, address: &str, text: &str) -> MessagingResult<SentMessage> {
        let address = normalize_address(address)?;
        require_text(text)?;

        if !self.check(&address).await? {
            return Err(MessagingError::Unreachable(address));
        }

        let conversation = match self.transport.find_dm(&address).await? {
            Some(existing) => existing,
            None => {
                tracing::debug!(%address, "No existing DM, creating one");
                self.transport.create_dm(&address).await?
            }
        };

        let message_id = self.transport.send_text(&conversation.id, text).await?;
        tracing::info!(conversation_id = %conversation.id, %address, "DM sent");
        Ok(SentMessage {
            conversation_id: conversation.id,
            message_id,
            recipient: address,
        })
    }

    pub async fn send_to_group(&self, group_id: &str, text: &str) -> MessagingResult<SentMessage> {
        require_text(text)?;
        self.transport.sync_all().await?;
        let group = self
            .transport
            .conversation(group_id)
            .await?
            .ok_or_else(|| MessagingError::ConversationNotFound(group_id.to_string()))?;

        let message_id = self.transport.send_text(&group.id, text).await?;
        tracing::info!(group_id = %group.id, "Group message sent");
        Ok(SentMessage {
            conversation_id: group.id.clone(),
            message_id,
            recipient: group.id,
        })
    }

    /// Create a group from the reachable subset of `members`.
    ///
    /// Fails only when nobody is reachable. The welcome message is sent
    /// after creation when given.
    pub async fn create_group(
        &self,
        name: Option<&str>,
        members: &[String],
        welcome: Option<&str>,
    ) -> MessagingResult<CreatedGroup> {
        let members = members
            .iter()
            .map(|m| normalize_address(m))
            .collect::<MessagingResult<Vec<_>>>()?;
        let reach = self.transport.can_message(&members).await?;
        let (reachable, unreachable): (Vec<String>, Vec<String>) = members
            .into_iter()
            .partition(|m| reach.get(m).copied().unwrap_or(false));

        if !unreachable.is_empty() {
            tracing::warn!(?unreachable, "Skipping members without XMTP");
        }
        if reachable.is_empty() {
            return Err(MessagingError::NoReachableMembers);
        }

        let name = name.filter(|n| !n.trim().is_empty()).unwrap_or(UNNAMED_GROUP).to_string();
        let options = GroupOptions {
            name: Some(name.clone()),
            description: None,
        };
        let group = self.transport.create_group(&reachable, &options).await?;
        tracing::info!(group_id = %group.id, members = reachable.len(), "Group created");

        let welcome_sent = match welcome.filter(|w| !w.trim().is_empty()) {
            Some(text) => {
                self.transport.send_text(&group.id, text).await?;
                true
            }
            None => false,
        };

        Ok(CreatedGroup {
            group_id: group.id,
            name,
            members: reachable,
            unreachable,
            welcome_sent,
        })
    }

    /// Allowed and unknown-consent conversations.
    pub async fn list(&self) -> MessagingResult<Vec<ConversationListing>> {
        self.transport.sync_all().await?;
        let conversations = self.transport.list(&VISIBLE_CONSENT).await?;
        Ok(conversations
            .into_iter()
            .map(|c| ConversationListing {
                kind: c.kind(),
                name: c.name.clone().unwrap_or_else(|| UNNAMED.to_string()),
                member_count: c.members.len(),
                id: c.id,
            })
            .collect())
    }

    pub async fn read(&self, conversation_id: &str, limit: Option<usize>) -> MessagingResult<Vec<ReceivedMessage>> {
        self.transport.sync_all().await?;
        let conversation = self
            .transport
            .conversation(conversation_id)
            .await?
            .ok_or_else(|| MessagingError::ConversationNotFound(conversation_id.to_string()))?;
        self.transport
            .messages(&conversation.id, limit.unwrap_or(DEFAULT_READ_LIMIT))
            .await
    }

    pub async fn stream(&self) -> MessagingResult<Subscription> {
        self.transport.sync_all().await?;
        self.transport.stream_all(&VISIBLE_CONSENT).await
    }
}

/// Hand every message to `on_message` until shutdown fires or the
/// subscription ends, then close it. Returns how many were handled.
pub async fn pump_until_shutdown<F>(
    mut subscription: Subscription,
    shutdown: &mut broadcast::Receiver<()>,
    mut on_message: F,
) -> usize
where
    F: FnMut(ReceivedMessage),
{
    let mut handled = 0;
    loop {
        tokio::select! {
            biased;
            _ = wait_for_shutdown(Some(&mut *shutdown)) => {
                tracing::info!(handled, "Stream interrupted");
                break;
            }
            next = subscription.next() => match next {
                Some(message) => {
                    handled += 1;
                    on_message(message);
                }
                None => break,
            },
        }
    }
    subscription.close();
    handled
}

fn require_text(text: &str) -> MessagingResult<()> {
    if text.trim().is_empty() {
        Err(MessagingError::EmptyMessage)
    } else {
        Ok(())
    }
}

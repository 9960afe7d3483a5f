//! In-process messaging network.
//!
//! Every transport connected to the same `LoopbackNetwork` sees the same
//! accounts and conversations. Only registered addresses are reachable.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::messaging::subscription::Subscription;
use crate::messaging::transport::{
    ClientOptions, ConsentState, ConversationInfo, GroupOptions, Identity, MessagingError, MessagingResult,
    MessagingTransport, ReceivedMessage,
};

const SUBSCRIPTION_BUFFER: usize = 64;

struct Room {
    info: ConversationInfo,
    is_dm: bool,
    seq: u64,
    messages: Vec<ReceivedMessage>,
}

struct Subscriber {
    address: String,
    consent: Vec<ConsentState>,
    tx: mpsc::Sender<ReceivedMessage>,
}

#[derive(Default)]
struct Network {
    inboxes: DashMap<String, String>,
    rooms: DashMap<String, Room>,
    subscribers: DashMap<u64, Subscriber>,
    next_seq: AtomicU64,
}

#[derive(Clone, Default)]
pub struct LoopbackNetwork {
    inner: Arc<Network>,
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `address` reachable and return its identity.
    pub fn register(&self, address: &str) -> Identity {
        let address = address.to_lowercase();
        let inbox_id = self
            .inner
            .inboxes
            .entry(address.clone())
            .or_insert_with(|| blake3::hash(address.as_bytes()).to_hex().as_str()[..32].to_string())
            .clone();
        Identity { address, inbox_id }
    }

    /// Connect as the account `options` describes, registering it.
    pub fn connect(&self, options: &ClientOptions) -> LoopbackTransport {
        let identity = self.register(&options.address);
        tracing::debug!(
            address = %identity.address,
            env = options.env.as_str(),
            db = %options.db_path.display(),
            "Loopback messaging client connected"
        );
        LoopbackTransport {
            network: self.clone(),
            identity,
        }
    }

    /// Connect as `address` without local database options.
    pub fn connect_as(&self, address: &str) -> LoopbackTransport {
        LoopbackTransport {
            network: self.clone(),
            identity: self.register(address),
        }
    }

    /// Returns false when the conversation does not exist.
    pub fn set_consent(&self, conversation_id: &str, consent: ConsentState) -> bool {
        match self.inner.rooms.get_mut(conversation_id) {
            Some(mut room) => {
                room.info.consent = consent;
                true
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    fn deliver(&self, message: &ReceivedMessage, info: &ConversationInfo, sender: &str) {
        let mut closed = Vec::new();
        for entry in self.inner.subscribers.iter() {
            let sub = entry.value();
            if sub.address == sender || !info.members.contains(&sub.address) || !sub.consent.contains(&info.consent) {
                continue;
            }
            match sub.tx.try_send(message.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = %sub.address, "Subscription buffer full, message dropped");
                }
                Err(TrySendError::Closed(_)) => closed.push(*entry.key()),
            }
        }
        for id in closed {
            self.inner.subscribers.remove(&id);
        }
    }
}

impl fmt::Debug for LoopbackNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopbackNetwork")
            .field("accounts", &self.inner.inboxes.len())
            .field("conversations", &self.inner.rooms.len())
            .field("subscribers", &self.inner.subscribers.len())
            .finish()
    }
}

/// One account's view of a `LoopbackNetwork`.
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    network: LoopbackNetwork,
    identity: Identity,
}

impl LoopbackTransport {
    pub fn network(&self) -> &LoopbackNetwork {
        &self.network
    }

    fn is_member(&self, info: &ConversationInfo) -> bool {
        info.members.contains(&self.identity.address)
    }

    fn open_room(&self, members: Vec<String>, options: &GroupOptions, is_dm: bool) -> ConversationInfo {
        let info = ConversationInfo {
            id: Uuid::new_v4().simple().to_string(),
            name: options.name.clone(),
            description: options.description.clone(),
            members,
            consent: ConsentState::Allowed,
        };
        let seq = self.network.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        self.network.inner.rooms.insert(
            info.id.clone(),
            Room {
                info: info.clone(),
                is_dm,
                seq,
                messages: Vec::new(),
            },
        );
        info
    }

    fn require_reachable(&self, address: &str) -> MessagingResult<()> {
        if self.network.inner.inboxes.contains_key(address) {
            Ok(())
        } else {
            Err(MessagingError::Unreachable(address.to_string()))
        }
    }
}

#[async_trait]
impl MessagingTransport for LoopbackTransport {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    async fn can_message(&self, addresses: &[String]) -> MessagingResult<HashMap<String, bool>> {
        Ok(addresses
            .iter()
            .map(|a| (a.clone(), self.network.inner.inboxes.contains_key(a)))
            .collect())
    }

    async fn sync_all(&self) -> MessagingResult<()> {
        Ok(())
    }

    async fn find_dm(&self, address: &str) -> MessagingResult<Option<ConversationInfo>> {
        Ok(self
            .network
            .inner
            .rooms
            .iter()
            .find(|room| room.is_dm && self.is_member(&room.info) && room.info.members.iter().any(|m| m == address))
            .map(|room| room.info.clone()))
    }

    async fn create_dm(&self, address: &str) -> MessagingResult<ConversationInfo> {
        self.require_reachable(address)?;
        let members = vec![self.identity.address.clone(), address.to_string()];
        Ok(self.open_room(members, &GroupOptions::default(), true))
    }

    async fn conversation(&self, id: &str) -> MessagingResult<Option<ConversationInfo>> {
        Ok(self
            .network
            .inner
            .rooms
            .get(id)
            .filter(|room| self.is_member(&room.info))
            .map(|room| room.info.clone()))
    }

    async fn list(&self, consent: &[ConsentState]) -> MessagingResult<Vec<ConversationInfo>> {
        let mut rooms: Vec<(u64, ConversationInfo)> = self
            .network
            .inner
            .rooms
            .iter()
            .filter(|room| self.is_member(&room.info) && consent.contains(&room.info.consent))
            .map(|room| (room.seq, room.info.clone()))
            .collect();
        rooms.sort_by_key(|(seq, _)| *seq);
        Ok(rooms.into_iter().map(|(_, info)| info).collect())
    }

    async fn send_text(&self, conversation_id: &str, text: &str) -> MessagingResult<String> {
        let not_found = || MessagingError::ConversationNotFound(conversation_id.to_string());
        let (message, info) = {
            let mut room = self.network.inner.rooms.get_mut(conversation_id).ok_or_else(not_found)?;
            if !self.is_member(&room.info) {
                return Err(not_found());
            }
            let message = ReceivedMessage {
                id: Uuid::new_v4().simple().to_string(),
                conversation_id: conversation_id.to_string(),
                sender_inbox_id: self.identity.inbox_id.clone(),
                content: text.to_string(),
                sent_at: Utc::now(),
            };
            room.messages.push(message.clone());
            (message, room.info.clone())
        };
        self.network.deliver(&message, &info, &self.identity.address);
        Ok(message.id)
    }

    async fn messages(&self, conversation_id: &str, limit: usize) -> MessagingResult<Vec<ReceivedMessage>> {
        let room = self
            .network
            .inner
            .rooms
            .get(conversation_id)
            .filter(|room| self.is_member(&room.info))
            .ok_or_else(|| MessagingError::ConversationNotFound(conversation_id.to_string()))?;
        let skip = room.messages.len().saturating_sub(limit);
        Ok(room.messages[skip..].to_vec())
    }

    async fn create_group(&self, members: &[String], options: &GroupOptions) -> MessagingResult<ConversationInfo> {
        let mut all = vec![self.identity.address.clone()];
        for member in members {
            self.require_reachable(member)?;
            if !all.contains(member) {
                all.push(member.clone());
            }
        }
        Ok(self.open_room(all, options, false))
    }

    async fn stream_all(&self, consent: &[ConsentState]) -> MessagingResult<Subscription> {
        let id = self.network.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        let (tx, subscription) = Subscription::channel(SUBSCRIPTION_BUFFER);
        self.network.inner.subscribers.insert(
            id,
            Subscriber {
                address: self.identity.address.clone(),
                consent: consent.to_vec(),
                tx,
            },
        );
        let network = self.network.inner.clone();
        Ok(subscription.on_close(move || {
            network.subscribers.remove(&id);
        }))
    }
}

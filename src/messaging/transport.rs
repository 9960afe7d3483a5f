//! The messaging transport seam and the values crossing it.

use alloy::primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::blockchain::Wallet;
use crate::config::{MessagingConfig, XmtpEnv};
use crate::messaging::keystore::{self, DbKey, KeystoreError};
use crate::messaging::subscription::Subscription;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("message is empty")]
    EmptyMessage,

    #[error("{0} cannot receive XMTP messages; they may not have XMTP enabled")]
    Unreachable(String),

    #[error("no members are reachable on XMTP; they need to have XMTP enabled")]
    NoReachableMembers,

    #[error("conversation {0} not found; make sure you're a member")]
    ConversationNotFound(String),

    #[error("messaging transport: {0}")]
    Transport(String),

    /// This build has no client for the messaging network.
    #[error("no messaging transport configured for the XMTP {0} network")]
    NoTransport(&'static str),

    #[error(transparent)]
    Keystore(#[from] KeystoreError),
}

impl MessagingError {
    /// Errors caused by the caller's input or setup rather than the network.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidAddress(_) | Self::EmptyMessage | Self::NoTransport(_))
    }
}

pub type MessagingResult<T> = Result<T, MessagingError>;

/// Lowercase `0x` form of an account address, rejecting anything else.
pub fn normalize_address(raw: &str) -> MessagingResult<String> {
    let address = Address::from_str(raw.trim()).map_err(|_| MessagingError::InvalidAddress(raw.to_string()))?;
    Ok(format!("{:#x}", address))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentState {
    Allowed,
    Unknown,
    Denied,
}

/// Consent states shown by `list` and `stream`.
pub const VISIBLE_CONSENT: [ConsentState; 2] = [ConsentState::Allowed, ConsentState::Unknown];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Dm,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationInfo {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Member addresses, lowercase.
    pub members: Vec<String>,
    pub consent: ConsentState,
}

impl ConversationInfo {
    /// More than two members makes a group; otherwise it reads as a DM.
    pub fn kind(&self) -> ConversationKind {
        if self.members.len() > 2 {
            ConversationKind::Group
        } else {
            ConversationKind::Dm
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_inbox_id: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ReceivedMessage {
    /// First eight characters of the sender's inbox id.
    pub fn short_sender(&self) -> String {
        let prefix: String = self.sender_inbox_id.chars().take(8).collect();
        format!("{}...", prefix)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Who a transport is connected as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub address: String,
    pub inbox_id: String,
}

/// Everything a transport needs to open its local database.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub address: String,
    pub env: XmtpEnv,
    pub app_version: String,
    pub db_path: PathBuf,
    pub db_key: DbKey,
}

impl ClientOptions {
    /// Build options for `wallet`, creating its database key on first use.
    pub fn for_wallet(config: &MessagingConfig, wallet: &Wallet) -> MessagingResult<Self> {
        let address = wallet.address_lowercase();
        let db_key = keystore::get_or_create_db_key(&config.data_dir, &address)?;
        let db_path = config
            .data_dir
            .join(format!("{}-{}.db3", address, config.env.as_str()));
        Ok(Self {
            address,
            env: config.env,
            app_version: config.app_version.clone(),
            db_path,
            db_key,
        })
    }
}

/// Operations a messaging network offers to a connected account.
///
/// Addresses crossing this trait are lowercase `0x` strings.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    fn identity(&self) -> &Identity;

    /// Reachability of each address.
    async fn can_message(&self, addresses: &[String]) -> MessagingResult<HashMap<String, bool>>;

    /// Pull remote state into the local view.
    async fn sync_all(&self) -> MessagingResult<()>;

    async fn find_dm(&self, address: &str) -> MessagingResult<Option<ConversationInfo>>;

    async fn create_dm(&self, address: &str) -> MessagingResult<ConversationInfo>;

    async fn conversation(&self, id: &str) -> MessagingResult<Option<ConversationInfo>>;

    async fn list(&self, consent: &[ConsentState]) -> MessagingResult<Vec<ConversationInfo>>;

    /// Returns the new message id.
    async fn send_text(&self, conversation_id: &str, text: &str) -> MessagingResult<String>;

    /// Most recent `limit` messages, oldest first.
    async fn messages(&self, conversation_id: &str, limit: usize) -> MessagingResult<Vec<ReceivedMessage>>;

    async fn create_group(&self, members: &[String], options: &GroupOptions) -> MessagingResult<ConversationInfo>;

    /// Every new message in conversations with the given consent states.
    async fn stream_all(&self, consent: &[ConsentState]) -> MessagingResult<Subscription>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address(" 0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266 ").unwrap(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert!(matches!(normalize_address("alice.eth"), Err(MessagingError::InvalidAddress(_))));
        assert!(matches!(normalize_address("0x1234"), Err(MessagingError::InvalidAddress(_))));
    }

    #[test]
    fn test_kind_by_member_count() {
        let mut info = ConversationInfo {
            id: "c1".into(),
            name: None,
            description: None,
            members: vec!["0xa".into(), "0xb".into()],
            consent: ConsentState::Allowed,
        };
        assert_eq!(info.kind(), ConversationKind::Dm);
        info.members.push("0xc".into());
        assert_eq!(info.kind(), ConversationKind::Group);
    }

    #[test]
    fn test_short_sender() {
        let msg = ReceivedMessage {
            id: "m".into(),
            conversation_id: "c".into(),
            sender_inbox_id: "abcdef0123456789".into(),
            content: "hi".into(),
            sent_at: Utc::now(),
        };
        assert_eq!(msg.short_sender(), "abcdef01...");
    }

    #[test]
    fn test_client_options_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = MessagingConfig {
            data_dir: dir.path().to_path_buf(),
            ..MessagingConfig::default()
        };
        let wallet =
            Wallet::from_private_key("0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80").unwrap();

        let options = ClientOptions::for_wallet(&config, &wallet).unwrap();
        assert_eq!(options.address, "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert_eq!(
            options.db_path,
            dir.path().join(format!("{}-{}.db3", options.address, config.env.as_str()))
        );

        let again = ClientOptions::for_wallet(&config, &wallet).unwrap();
        assert_eq!(options.db_key, again.db_key);
    }
}

//! XMTP-style wallet-to-wallet messaging.
//!
//! # Data Flow
//! ```text
//! Wallet + MessagingConfig
//!     → keystore.rs   (<data_dir>/<address>-db-key, created once, 0600)
//!     → ClientOptions (db path, env, app version)
//!     → MessagingTransport impl (loopback.rs in-process, or a network client)
//!     → messenger.rs  (reachability checks, DM reuse, group creation, reads)
//!     → Subscription  (stream until shutdown, then close)
//! ```
//!
//! Addresses are normalized to lowercase `0x` form before they reach a
//! transport.

pub mod keystore;
pub mod loopback;
pub mod messenger;
pub mod subscription;
pub mod transport;

pub use keystore::{get_or_create_db_key, DbKey, KeystoreError};
pub use loopback::{LoopbackNetwork, LoopbackTransport};
pub use messenger::{pump_until_shutdown, ConversationListing, CreatedGroup, Messenger, SentMessage};
pub use subscription::Subscription;
pub use transport::{
    normalize_address, ClientOptions, ConsentState, ConversationInfo, ConversationKind, GroupOptions, Identity,
    MessagingError, MessagingResult, MessagingTransport, ReceivedMessage,
};

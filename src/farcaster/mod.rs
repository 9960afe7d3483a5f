//! Farcaster integrations.
//!
//! # Data Flow
//! ```text
//! cast channel|group
//!     → Publisher<HubService, ContentSigner>
//!         resolve: NeynarClient (channel parent URL, group info)
//!         draft:   message.rs (CAST_ADD envelope, BLAKE3 hash)
//!         submit:  POST {hub}/v1/submitMessage
//!         verify:  GET  {hub}/v1/castById
//!
//! dm send|inbox|conversation
//!     → DirectCastClient (warpcast.rs, bearer auth, idempotency key)
//!     → format.rs (presenter rows)
//! ```

pub mod format;
pub mod hub;
pub mod message;
pub mod neynar;
pub mod types;
pub mod warpcast;

pub use hub::{cast_url, channel_url, group_url, HubService};
pub use neynar::NeynarClient;
pub use warpcast::{DirectCastClient, Fetched};

//! Farcaster agent library: hub casting, Warpcast direct casts, XMTP-style
//! messaging and Relay bridging behind one request/sign/submit/verify core.

// Core flow
pub mod publish;
pub mod signing;

// Services
pub mod blockchain;
pub mod bridge;
pub mod farcaster;
pub mod messaging;

// Cross-cutting concerns
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub mod cli;

pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use lifecycle::Shutdown;
pub use publish::{Publisher, RemoteService};

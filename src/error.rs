//! Crate-level error for command entry points.

use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::bridge::BridgeError;
use crate::config::ConfigError;
use crate::credentials::{CredentialError, StoreError};
use crate::http::RemoteError;
use crate::messaging::MessagingError;
use crate::publish::PublishError;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Bad command-line input.
    #[error("{0}")]
    Usage(String),

    /// A lookup came back empty.
    #[error("{0} not found")]
    NotFound(String),

    #[error("could not render output: {0}")]
    Render(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),
}

impl AgentError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// True when the failure happened before any network call.
    pub fn is_config(&self) -> bool {
        match self {
            Self::Usage(_) | Self::Config(_) | Self::Credentials(_) | Self::Store(_) => true,
            Self::Publish(e) => e.is_config(),
            Self::Bridge(e) => e.is_config(),
            Self::Messaging(e) => e.is_config(),
            Self::NotFound(_) | Self::Render(_) | Self::Remote(_) | Self::Blockchain(_) => false,
        }
    }

    /// What the user can do about it, when there is something to say.
    pub fn guidance(&self) -> Option<&'static str> {
        let remote = match self {
            Self::Credentials(e) => return e.guidance(),
            Self::Remote(e) => e,
            Self::Publish(PublishError::Remote(e)) => e,
            Self::Bridge(BridgeError::Remote(e)) => e,
            Self::Messaging(MessagingError::Unreachable(_) | MessagingError::NoReachableMembers) => {
                return Some("XMTP uses Ethereum addresses, not Farcaster FIDs; recipients must have XMTP enabled.")
            }
            Self::Messaging(MessagingError::NoTransport(_)) => {
                return Some("This build has no XMTP network client; messaging commands are unavailable.")
            }
            Self::Bridge(BridgeError::Unconfirmed { .. }) => {
                return Some("The deposit was broadcast; look up the transaction hash before retrying.")
            }
            Self::Bridge(BridgeError::Chain(BlockchainError::ChainMismatch { .. })) => {
                return Some("Check the rpc_url configured for this chain in [chains].")
            }
            _ => return None,
        };
        remote.auth_guidance()
    }
}

pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialKind;

    #[test]
    fn test_config_classification() {
        assert!(AgentError::usage("bad amount").is_config());
        assert!(AgentError::from(CredentialError::Missing(CredentialKind::Fid)).is_config());
        assert!(AgentError::from(PublishError::config("fid is zero")).is_config());

        let rejected = RemoteError::Rejected {
            service: "hub",
            status: 500,
            body: "boom".into(),
        };
        assert!(!AgentError::from(rejected).is_config());
    }

    #[test]
    fn test_guidance_reaches_through_wrappers() {
        let unauthorized = RemoteError::Rejected {
            service: "warpcast",
            status: 401,
            body: "{}".into(),
        };
        let err = AgentError::from(PublishError::from(unauthorized));
        assert!(err.guidance().unwrap().contains("Warpcast API key"));

        let missing = AgentError::from(CredentialError::Missing(CredentialKind::WarpcastApiKey));
        assert!(missing.guidance().is_some());

        let unreachable = AgentError::from(MessagingError::Unreachable("0xabc".into()));
        assert!(unreachable.guidance().unwrap().contains("not Farcaster FIDs"));

        assert!(AgentError::usage("x").guidance().is_none());
    }
}

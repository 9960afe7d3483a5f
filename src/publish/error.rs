//! Publish flow errors.

use thiserror::Error;

use crate::http::RemoteError;
use crate::signing::{SigningDomain, SigningError};

/// Errors from the build / resolve / sign / submit steps.
///
/// Verification never produces one of these; an unconfirmed submission is
/// reported through `SubmissionResult::verified`.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Missing or invalid identifier detected before any network call.
    #[error("configuration error: {0}")]
    Config(String),

    /// The signer's key family does not match what the service accepts.
    #[error("{service} requires a {expected} signer, got {actual}")]
    SignerMismatch {
        service: &'static str,
        expected: SigningDomain,
        actual: SigningDomain,
    },

    /// The destination does not exist or could not be looked up.
    #[error("destination '{destination}' could not be resolved: {reason}")]
    Unresolved { destination: String, reason: String },

    /// The signer failed.
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// Transport failure or remote rejection.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl PublishError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors raised before anything was sent.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::SignerMismatch { .. })
    }

    /// HTTP status of a remote rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote(e) => e.status(),
            _ => None,
        }
    }
}

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

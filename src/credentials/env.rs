//! Credentials read from the process environment (or any key lookup).
//!
//! Each accessor fails with a `CredentialError` that names the variable and
//! says where to obtain it, before any network call is made.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::blockchain::Wallet;
use crate::credentials::store::StoreError;
use crate::signing::ContentSigner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    WalletKey,
    SignerKey,
    Fid,
    WarpcastApiKey,
    NeynarApiKey,
}

impl CredentialKind {
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::WalletKey => "PRIVATE_KEY",
            Self::SignerKey => "SIGNER_PRIVATE_KEY",
            Self::Fid => "FID",
            Self::WarpcastApiKey => "WARPCAST_API_KEY",
            Self::NeynarApiKey => "NEYNAR_API_KEY",
        }
    }

    pub fn guidance(&self) -> &'static str {
        match self {
            Self::WalletKey => "Set PRIVATE_KEY to the custody wallet private key (0x-prefixed hex).",
            Self::SignerKey => {
                "Set SIGNER_PRIVATE_KEY to the Ed25519 signer private key (hex, no 0x prefix). \
                 The signer must be registered for your FID."
            }
            Self::Fid => "Set FID to your numeric Farcaster ID.",
            Self::WarpcastApiKey => {
                "Warpcast direct casts need a Warpcast API key, separate from your signer key. \
                 In Warpcast: Settings > Developer Mode, then Developer Tools > API Keys. \
                 Set it as WARPCAST_API_KEY."
            }
            Self::NeynarApiKey => "Channel lookups need a Neynar API key from https://dev.neynar.com; set NEYNAR_API_KEY.",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_var())
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{0} is not set")]
    Missing(CredentialKind),

    #[error("{kind} is invalid: {reason}")]
    Invalid { kind: CredentialKind, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CredentialError {
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::Missing(kind) | Self::Invalid { kind, .. } => Some(kind.guidance()),
            Self::Store(_) => None,
        }
    }
}

pub type CredentialResult<T> = Result<T, CredentialError>;

/// Secrets and identifiers for one account. `Debug` hides secret values.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warpcast_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neynar_api_key: Option<String>,
}

impl Credentials {
    /// Read credentials through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> CredentialResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |kind: CredentialKind| {
            lookup(kind.env_var())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let fid = match get(CredentialKind::Fid) {
            Some(raw) => Some(parse_fid(&raw)?),
            None => None,
        };

        Ok(Self {
            private_key: get(CredentialKind::WalletKey),
            signer_private_key: get(CredentialKind::SignerKey),
            fid,
            warpcast_api_key: get(CredentialKind::WarpcastApiKey),
            neynar_api_key: get(CredentialKind::NeynarApiKey),
        })
    }

    pub fn from_env() -> CredentialResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// True when every field is set.
    pub fn is_complete(&self) -> bool {
        self.private_key.is_some()
            && self.signer_private_key.is_some()
            && self.fid.is_some()
            && self.warpcast_api_key.is_some()
            && self.neynar_api_key.is_some()
    }

    /// Fill unset fields from `base`. Values already present win.
    pub fn or(self, base: Credentials) -> Self {
        Self {
            private_key: self.private_key.or(base.private_key),
            signer_private_key: self.signer_private_key.or(base.signer_private_key),
            fid: self.fid.or(base.fid),
            warpcast_api_key: self.warpcast_api_key.or(base.warpcast_api_key),
            neynar_api_key: self.neynar_api_key.or(base.neynar_api_key),
        }
    }

    pub fn wallet(&self) -> CredentialResult<Wallet> {
        let key = self
            .private_key
            .as_deref()
            .ok_or(CredentialError::Missing(CredentialKind::WalletKey))?;
        Wallet::from_private_key(key).map_err(|e| CredentialError::Invalid {
            kind: CredentialKind::WalletKey,
            reason: e.to_string(),
        })
    }

    pub fn content_signer(&self) -> CredentialResult<ContentSigner> {
        let seed = self
            .signer_private_key
            .as_deref()
            .ok_or(CredentialError::Missing(CredentialKind::SignerKey))?;
        ContentSigner::from_hex(seed).map_err(|e| CredentialError::Invalid {
            kind: CredentialKind::SignerKey,
            reason: e.to_string(),
        })
    }

    pub fn fid(&self) -> CredentialResult<u64> {
        self.fid.ok_or(CredentialError::Missing(CredentialKind::Fid))
    }

    pub fn warpcast_api_key(&self) -> CredentialResult<&str> {
        self.warpcast_api_key
            .as_deref()
            .ok_or(CredentialError::Missing(CredentialKind::WarpcastApiKey))
    }

    pub fn neynar_api_key(&self) -> CredentialResult<&str> {
        self.neynar_api_key
            .as_deref()
            .ok_or(CredentialError::Missing(CredentialKind::NeynarApiKey))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("private_key", &mark(&self.private_key))
            .field("signer_private_key", &mark(&self.signer_private_key))
            .field("fid", &self.fid)
            .field("warpcast_api_key", &mark(&self.warpcast_api_key))
            .field("neynar_api_key", &mark(&self.neynar_api_key))
            .finish()
    }
}

fn parse_fid(raw: &str) -> CredentialResult<u64> {
    match raw.parse::<u64>() {
        Ok(0) => Err(CredentialError::Invalid {
            kind: CredentialKind::Fid,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(fid) => Ok(fid),
        Err(e) => Err(CredentialError::Invalid {
            kind: CredentialKind::Fid,
            reason: e.to_string(),
        }),
    }
}

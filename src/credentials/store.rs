//! Named accounts persisted as one JSON file.
//!
//! The file is rewritten whole on every change, through a sibling temp file
//! created with owner-only permissions and renamed into place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::credentials::env::Credentials;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("credential store {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no saved account named '{0}'")]
    UnknownAccount(String),

    #[error("account name must not be empty")]
    EmptyName,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAccount {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub saved_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreFile {
    #[serde(default)]
    active: Option<String>,
    #[serde(default)]
    accounts: BTreeMap<String, StoredAccount>,
}

/// What `list` shows for an account. No secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub name: String,
    pub fid: Option<u64>,
    pub active: bool,
    pub has_signer: bool,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save `credentials` under `name`, replacing any previous entry.
    ///
    /// The first saved account becomes active even without `activate`.
    pub fn save(&self, name: &str, credentials: &Credentials, activate: bool) -> StoreResult<()> {
        let name = require_name(name)?;
        let mut file = self.load()?;
        let now = Utc::now();
        let saved_at = file.accounts.get(name).map(|a| a.saved_at).unwrap_or(now);
        file.accounts.insert(
            name.to_string(),
            StoredAccount {
                credentials: credentials.clone(),
                saved_at,
                updated_at: now,
            },
        );
        if activate || file.active.is_none() {
            file.active = Some(name.to_string());
        }
        self.write(&file)?;
        tracing::info!(account = name, path = %self.path.display(), "Credentials saved");
        Ok(())
    }

    /// Merge the fields set in `patch` into an existing account.
    pub fn update(&self, name: &str, patch: &Credentials) -> StoreResult<()> {
        let mut file = self.load()?;
        let account = file
            .accounts
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownAccount(name.to_string()))?;
        account.credentials = patch.clone().or(account.credentials.clone());
        account.updated_at = Utc::now();
        self.write(&file)?;
        tracing::info!(account = name, "Credentials updated");
        Ok(())
    }

    pub fn set_active(&self, name: &str) -> StoreResult<()> {
        let mut file = self.load()?;
        if !file.accounts.contains_key(name) {
            return Err(StoreError::UnknownAccount(name.to_string()));
        }
        file.active = Some(name.to_string());
        self.write(&file)
    }

    pub fn list(&self) -> StoreResult<Vec<AccountSummary>> {
        let file = self.load()?;
        Ok(file
            .accounts
            .iter()
            .map(|(name, account)| AccountSummary {
                name: name.clone(),
                fid: account.credentials.fid,
                active: file.active.as_deref() == Some(name.as_str()),
                has_signer: account.credentials.signer_private_key.is_some(),
                saved_at: account.saved_at,
            })
            .collect())
    }

    pub fn account(&self, name: &str) -> StoreResult<Credentials> {
        self.load()?
            .accounts
            .remove(name)
            .map(|a| a.credentials)
            .ok_or_else(|| StoreError::UnknownAccount(name.to_string()))
    }

    /// The active account's name and credentials, if any.
    pub fn active(&self) -> StoreResult<Option<(String, Credentials)>> {
        let mut file = self.load()?;
        Ok(file
            .active
            .and_then(|name| file.accounts.remove(&name).map(|a| (name, a.credentials))))
    }

    /// A missing file reads as an empty store.
    fn load(&self) -> StoreResult<StoreFile> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoreFile::default()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&text).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, file: &StoreFile) -> StoreResult<()> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(file).map_err(|e| io_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, json.as_bytes()).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

/// Write `contents` to a freshly created owner-only file.
///
/// A leftover file at `path` is removed first so neither its mode nor any
/// descriptor already open on it carries over.
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed stale temp file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    file.sync_all()
}

fn require_name(name: &str) -> StoreResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        Err(StoreError::EmptyName)
    } else {
        Ok(name)
    }
}

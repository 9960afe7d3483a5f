//! Local database encryption keys, one per account address.
//!
//! `<dir>/<lowercase address>-db-key` holds 32 bytes as hex. An existing file
//! is always reused as-is; losing it loses access to the local database.

use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DB_KEY_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("key file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but does not hold a key. It is never overwritten.
    #[error("key file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// A database encryption key. `Debug` does not print the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct DbKey([u8; DB_KEY_LEN]);

impl DbKey {
    pub fn as_bytes(&self) -> &[u8; DB_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DbKey(<redacted>)")
    }
}

/// Path of the key file for `address`.
pub fn key_path(dir: &Path, address: &str) -> PathBuf {
    dir.join(format!("{}-db-key", address.to_lowercase()))
}

/// Read the key for `address`, generating and persisting one on first use.
pub fn get_or_create_db_key(dir: &Path, address: &str) -> Result<DbKey, KeystoreError> {
    let path = key_path(dir, address);
    match read_key(&path) {
        Ok(key) => return Ok(key),
        Err(KeystoreError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    fs::create_dir_all(dir).map_err(|source| KeystoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut key = [0u8; DB_KEY_LEN];
    OsRng.fill_bytes(&mut key);

    match write_new(&path, &hex::encode(key)) {
        Ok(()) => {
            tracing::info!(address = %address.to_lowercase(), "Created new database encryption key");
            Ok(DbKey(key))
        }
        // Another process created it first; use theirs.
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => read_key(&path),
        Err(source) => Err(KeystoreError::Io { path, source }),
    }
}

fn read_key(path: &Path) -> Result<DbKey, KeystoreError> {
    let text = fs::read_to_string(path).map_err(|source| KeystoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let corrupt = |reason: String| KeystoreError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = hex::decode(text.trim()).map_err(|e| corrupt(e.to_string()))?;
    let key: [u8; DB_KEY_LEN] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| corrupt(format!("expected {} bytes, found {}", DB_KEY_LEN, b.len())))?;
    Ok(DbKey(key))
}

/// Create `path` exclusively with owner-only permissions.
fn write_new(path: &Path, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const BOB: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    #[test]
    fn test_same_address_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let first = get_or_create_db_key(dir.path(), ALICE).unwrap();
        let second = get_or_create_db_key(dir.path(), ALICE).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());

        let lower = get_or_create_db_key(dir.path(), &ALICE.to_lowercase()).unwrap();
        assert_eq!(first, lower);
    }

    #[test]
    fn test_different_addresses_different_keys() {
        let dir = tempfile::tempdir().unwrap();
        let alice = get_or_create_db_key(dir.path(), ALICE).unwrap();
        let bob = get_or_create_db_key(dir.path(), BOB).unwrap();
        assert_ne!(alice, bob);
    }

    #[test]
    fn test_existing_file_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let hex_key = "11".repeat(DB_KEY_LEN);
        fs::write(key_path(dir.path(), ALICE), format!("{}\n", hex_key)).unwrap();

        let key = get_or_create_db_key(dir.path(), ALICE).unwrap();
        assert_eq!(key.as_bytes(), &[0x11; DB_KEY_LEN]);
    }

    #[test]
    fn test_corrupt_file_is_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = key_path(dir.path(), ALICE);
        fs::write(&path, "not hex").unwrap();

        let err = get_or_create_db_key(dir.path(), ALICE).unwrap_err();
        assert!(matches!(err, KeystoreError::Corrupt { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "not hex");
    }

    #[test]
    fn test_creates_missing_directory_and_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("xmtp").join("data");
        get_or_create_db_key(&nested, ALICE).unwrap();

        let path = nested.join("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266-db-key");
        let stored = fs::read_to_string(&path).unwrap();
        assert_eq!(stored.len(), DB_KEY_LEN * 2);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_debug_is_redacted() {
        let dir = tempfile::tempdir().unwrap();
        let key = get_or_create_db_key(dir.path(), ALICE).unwrap();
        assert_eq!(format!("{:?}", key), "DbKey(<redacted>)");
    }
}

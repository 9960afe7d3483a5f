//! Credential resolution.
//!
//! # Data Flow
//! ```text
//! environment (PRIVATE_KEY, SIGNER_PRIVATE_KEY, FID, WARPCAST_API_KEY, NEYNAR_API_KEY)
//!     → env.rs   Credentials::from_env
//!     → .or(active account from store.rs)   environment wins; store read only
//!                                           when a field is unset
//!     → typed accessors (wallet, content_signer, fid, api keys)
//!     → CredentialError with guidance when something is missing
//! ```
//!
//! # Security Constraints
//! - Secrets never appear in `Debug` output or logs
//! - The store file is written 0600

pub mod env;
pub mod store;

pub use env::{CredentialError, CredentialKind, CredentialResult, Credentials};
pub use store::{AccountSummary, CredentialStore, StoreError, StoredAccount};

/// Environment credentials completed by the store's active account.
pub fn resolve(store: &CredentialStore) -> CredentialResult<Credentials> {
    resolve_from(|key| std::env::var(key).ok(), store)
}

/// [`resolve`] with an explicit variable lookup.
///
/// The store is only read when the lookup leaves a field unset. An unreadable
/// store is logged and skipped so a complete environment keeps working.
pub fn resolve_from<F>(lookup: F, store: &CredentialStore) -> CredentialResult<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = Credentials::from_lookup(lookup)?;
    if from_env.is_complete() {
        return Ok(from_env);
    }
    match store.active() {
        Ok(Some((name, stored))) => {
            tracing::debug!(account = %name, "Using stored account for unset credentials");
            Ok(from_env.or(stored))
        }
        Ok(None) => Ok(from_env),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unreadable credential store");
            Ok(from_env)
        }
    }
}

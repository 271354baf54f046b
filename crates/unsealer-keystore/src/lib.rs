//! Key-value secret store abstraction for `unsealer`.
//!
//! This crate defines the [`KeyStore`] trait — the narrow interface through
//! which unseal shares and the root token are durably persisted between
//! process restarts. It knows nothing about vaults, shares, or key naming;
//! the orchestrator in `unsealer-core` owns all of that.
//!
//! Implementations provided:
//!
//! - [`MemoryKeyStore`] — in-memory, for tests and local development
//! - [`FileKeyStore`] — one file per key under a directory, for bare-metal
//!   deployments
//! - [`S3KeyStore`] — one object per key in an S3 bucket (feature `s3-backend`)

mod error;
mod file;
mod memory;
#[cfg(feature = "s3-backend")]
mod s3;

pub use error::KeyStoreError;
pub use file::FileKeyStore;
pub use memory::MemoryKeyStore;
#[cfg(feature = "s3-backend")]
pub use s3::S3KeyStore;

/// Key used by [`KeyStore::check_write_access`] for its standalone probe.
const ACCESS_PROBE_KEY: &str = "unsealer-access-probe";

/// Payload written during write probes and read back for comparison.
const PROBE_PAYLOAD: &[u8] = b"unsealer-probe";

/// A pluggable key-value secret store.
///
/// Keys are flat UTF-8 strings (e.g. `vault-unsealer-unseal-0`); values are
/// opaque byte blobs. Retrieval of an absent key must fail with
/// [`KeyStoreError::NotFound`] so callers can tell "absent" apart from
/// backend failures.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait KeyStore: Send + Sync + 'static {
    /// Retrieve the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::NotFound`] if the key does not exist, or
    /// [`KeyStoreError::Read`] if the backend fails.
    async fn get(&self, key: &str) -> Result<Vec<u8>, KeyStoreError>;

    /// Store `value` under `key`, overwriting any existing value.
    ///
    /// Overwrite protection is a policy concern and lives in the caller,
    /// not here.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Write`] if the backend fails.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), KeyStoreError>;

    /// Delete `key`. Idempotent — deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Delete`] if the backend fails.
    async fn delete(&self, key: &str) -> Result<(), KeyStoreError>;

    /// Probe the store by writing a known payload under `key`, reading it
    /// back, comparing, and deleting it.
    ///
    /// Backends may override this with a cheaper native check.
    ///
    /// # Errors
    ///
    /// Returns the failing operation's error, or
    /// [`KeyStoreError::ProbeMismatch`] if the read-back value differs.
    async fn test(&self, key: &str) -> Result<(), KeyStoreError> {
        self.set(key, PROBE_PAYLOAD).await?;
        let read_back = self.get(key).await?;
        if read_back != PROBE_PAYLOAD {
            return Err(KeyStoreError::ProbeMismatch {
                key: key.to_owned(),
            });
        }
        self.delete(key).await
    }

    /// Standalone read/write diagnostic under a fixed probe key, distinct
    /// from any caller-namespaced probe.
    ///
    /// # Errors
    ///
    /// Propagates whatever [`test`](KeyStore::test) returns.
    async fn check_write_access(&self) -> Result<(), KeyStoreError> {
        self.test(ACCESS_PROBE_KEY).await
    }
}

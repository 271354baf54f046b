//! Vault control-API capability.
//!
//! The orchestrator only needs three operations from the vault server:
//! seal-status, single-share unseal, and one-time init. They are modeled as
//! the [`VaultClient`] trait so tests can script a vault without a server
//! and so the orchestrator never touches HTTP directly.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Seal status as reported by the vault.
///
/// Wire shape matches `GET /v1/sys/seal-status`. The orchestrator consults
/// only `sealed` and `progress`; the rest is carried for status display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealStatus {
    /// Whether the vault is currently sealed.
    pub sealed: bool,
    /// Shares required to unseal.
    #[serde(default)]
    pub t: u32,
    /// Total shares the master key was split into.
    #[serde(default)]
    pub n: u32,
    /// Valid shares submitted so far in the current unseal attempt. A reset
    /// to 0 immediately after a submission means the share was rejected.
    #[serde(default)]
    pub progress: u32,
}

/// Response from a successful vault initialization.
///
/// Wire shape matches `PUT /v1/sys/init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitResponse {
    /// Unseal shares, one per requested share, in generation order.
    pub keys: Vec<String>,
    /// The full-privilege root token. Issued exactly once.
    pub root_token: String,
}

/// Capability to perform seal-lifecycle operations against a vault server.
#[async_trait::async_trait]
pub trait VaultClient: Send + Sync + 'static {
    /// Query the current seal status.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or API failure.
    async fn seal_status(&self) -> Result<SealStatus, ClientError>;

    /// Submit a single unseal share and return the post-submission status.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport or API failure. A rejected share
    /// is not an error at this layer — it surfaces as `progress == 0` in the
    /// returned status.
    async fn unseal(&self, share: &str) -> Result<SealStatus, ClientError>;

    /// Request one-time initialization with the given share count and
    /// threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or if the vault refuses
    /// (e.g. already initialized).
    async fn init(&self, shares: u32, threshold: u32) -> Result<InitResponse, ClientError>;
}

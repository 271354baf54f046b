//! Error types for `unsealer-core`.
//!
//! Orchestrator errors name the operation and the keystore key or share
//! index involved, so a failed bootstrap can be diagnosed from logs alone.
//! Share material and the root token never appear in errors.

use unsealer_keystore::KeyStoreError;

/// Errors from talking to the vault server's control API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (connection refused, TLS, timeout).
    #[error("vault request failed: {reason}")]
    Request { reason: String },

    /// The vault returned a non-success status.
    #[error("vault returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("failed to decode vault response: {reason}")]
    Decode { reason: String },
}

/// Errors from the unseal/init orchestrator.
///
/// Every variant is terminal: the orchestrator performs no retries. A
/// scheduler that wants retry semantics re-invokes the operation.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Checking the vault's seal status failed.
    #[error("failed to check seal status: {source}")]
    StatusCheck {
        #[source]
        source: ClientError,
    },

    /// The keystore had no share at the next index. This is how the unseal
    /// loop discovers it has consumed every stored share without reaching
    /// the threshold.
    #[error("no stored unseal share at '{key}': threshold not reached with available shares")]
    SharesExhausted { key: String },

    /// Retrieving a stored share failed for a reason other than absence.
    #[error("failed to retrieve unseal share '{key}': {source}")]
    KeyRetrieval {
        key: String,
        #[source]
        source: KeyStoreError,
    },

    /// Submitting a share to the vault failed at the transport/API level.
    #[error("failed to submit unseal share '{key}' to vault: {source}")]
    UnsealSubmit {
        key: String,
        #[source]
        source: ClientError,
    },

    /// The vault reset unseal progress to zero after a submission — the
    /// share was rejected as invalid.
    #[error("vault rejected unseal share '{key}': progress reset to 0")]
    ProgressReset { key: String },

    /// The keystore write/read probe before init failed.
    #[error("keystore probe failed before init: {source}")]
    InitPrecheck {
        #[source]
        source: KeyStoreError,
    },

    /// A key this init would write already exists (or could not be checked)
    /// and overwriting is disabled.
    #[error("refusing to init: keystore key '{key}' already exists or could not be verified absent")]
    PreexistingKey { key: String },

    /// The vault's init request itself failed (e.g. already initialized).
    #[error("vault initialization failed: {source}")]
    VaultInit {
        #[source]
        source: ClientError,
    },

    /// Persisting a generated unseal share failed. Shares written before
    /// this one remain in the keystore.
    #[error("failed to store unseal share '{key}': {source}")]
    KeyPersist {
        key: String,
        #[source]
        source: KeyStoreError,
    },

    /// Persisting the root token failed. All unseal shares were already
    /// written and remain in the keystore.
    #[error("failed to store root token under '{key}': {source}")]
    RootPersist {
        key: String,
        #[source]
        source: KeyStoreError,
    },

    /// The standalone keystore read/write diagnostic failed.
    #[error("keystore read/write access check failed: {source}")]
    AccessCheck {
        #[source]
        source: KeyStoreError,
    },
}

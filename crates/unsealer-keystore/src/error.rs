//! Error types for `unsealer-keystore`.
//!
//! Every variant names the key involved so failures can be traced to a
//! specific stored share without a debugger. Values never appear in errors.

/// Errors from key-value secret store operations.
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    /// The key does not exist in the store. Callers rely on this being
    /// distinguishable from transport or permission failures.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// Reading a key failed for a reason other than absence.
    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Writing a key failed.
    #[error("failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },

    /// Deleting a key failed.
    #[error("failed to delete key '{key}': {reason}")]
    Delete { key: String, reason: String },

    /// A write probe read back a different value than it wrote.
    #[error("probe value mismatch on key '{key}'")]
    ProbeMismatch { key: String },

    /// Backend setup or connectivity failure not tied to a single key.
    #[error("keystore backend error: {reason}")]
    Backend { reason: String },
}

impl KeyStoreError {
    /// Whether this error is the distinguishable "key absent" condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

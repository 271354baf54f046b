//! Init/unseal orchestration.
//!
//! The [`UnsealOrchestrator`] composes a [`KeyStore`] and a [`VaultClient`]
//! to drive a vault from sealed/uninitialized to unsealed:
//!
//! 1. **Init** (once): probe the keystore, refuse to clobber existing keys,
//!    ask the vault to generate shares, persist each share (and optionally
//!    the root token) under deterministic key names.
//!
//! 2. **Unseal** (every restart): read shares back index by index and submit
//!    them until the vault reports unsealed.
//!
//! Key names are a persisted contract — `{prefix}-unseal-{i}`,
//! `{prefix}-root`, `{prefix}-test` — derivable from configuration alone, so
//! a later process can find the shares without any extra stored state.
//!
//! Operations are sequential and never retried here; polling/retry cadence
//! belongs to the caller. The overwrite guard is check-then-write and not
//! atomic: concurrent `init` runs against the same prefix must be serialized
//! externally (e.g. a deploy-time lock).

use std::sync::Arc;

use tracing::{debug, info, warn};
use unsealer_keystore::{KeyStore, KeyStoreError};

use crate::client::VaultClient;
use crate::error::OrchestratorError;

/// Configuration for an orchestrator, immutable for its lifetime.
#[derive(Debug, Clone)]
pub struct VaultOptions {
    /// Namespace for every keystore key this orchestrator owns.
    pub key_prefix: String,
    /// Number of unseal shares to generate at init.
    pub secret_shares: u32,
    /// Minimum shares required to unseal.
    pub secret_threshold: u32,
    /// When false, init refuses to overwrite any existing keystore entry.
    pub overwrite_existing: bool,
    /// When false, the root token is logged once at init and never persisted.
    pub store_root_token: bool,
}

impl Default for VaultOptions {
    fn default() -> Self {
        Self {
            key_prefix: "vault-unsealer".to_owned(),
            secret_shares: 5,
            secret_threshold: 3,
            overwrite_existing: false,
            store_root_token: true,
        }
    }
}

/// Drives a vault through init and unseal using shares persisted in a
/// keystore.
///
/// Both collaborators are injected; the orchestrator holds no ambient state
/// and owns no I/O of its own.
pub struct UnsealOrchestrator {
    keystore: Arc<dyn KeyStore>,
    client: Arc<dyn VaultClient>,
    options: VaultOptions,
}

impl std::fmt::Debug for UnsealOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsealOrchestrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl UnsealOrchestrator {
    /// Create an orchestrator over the given keystore and vault client.
    #[must_use]
    pub fn new(
        keystore: Arc<dyn KeyStore>,
        client: Arc<dyn VaultClient>,
        options: VaultOptions,
    ) -> Self {
        Self {
            keystore,
            client,
            options,
        }
    }

    /// Return whether the vault currently reports itself sealed.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::StatusCheck`] if the status call fails.
    pub async fn sealed(&self) -> Result<bool, OrchestratorError> {
        let status = self
            .client
            .seal_status()
            .await
            .map_err(|source| OrchestratorError::StatusCheck { source })?;
        Ok(status.sealed)
    }

    /// Unseal the vault using previously stored shares.
    ///
    /// Reads `{prefix}-unseal-0`, `-1`, ... and submits each share until the
    /// vault reports unsealed. The loop has no intrinsic index bound: it ends
    /// in success, in [`OrchestratorError::SharesExhausted`] when the next
    /// index is absent from the keystore (all stored shares consumed without
    /// reaching the threshold), or in a terminal submission failure.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::SharesExhausted`] — next share key absent.
    /// - [`OrchestratorError::KeyRetrieval`] — keystore read failed.
    /// - [`OrchestratorError::UnsealSubmit`] — submission call failed.
    /// - [`OrchestratorError::ProgressReset`] — the vault reset progress to
    ///   0, i.e. rejected the share. Never retried.
    pub async fn unseal(&self) -> Result<(), OrchestratorError> {
        let mut i: u32 = 0;
        loop {
            let key = self.unseal_key(i);

            debug!(key = %key, "retrieving unseal share from keystore");
            let share = match self.keystore.get(&key).await {
                Ok(bytes) => bytes,
                Err(e) if e.is_not_found() => {
                    return Err(OrchestratorError::SharesExhausted { key });
                }
                Err(source) => {
                    return Err(OrchestratorError::KeyRetrieval { key, source });
                }
            };
            let share = String::from_utf8_lossy(&share).into_owned();

            debug!(key = %key, "submitting unseal share to vault");
            let status = self
                .client
                .unseal(&share)
                .await
                .map_err(|source| OrchestratorError::UnsealSubmit {
                    key: key.clone(),
                    source,
                })?;

            if !status.sealed {
                info!(shares_used = i + 1, "vault unsealed");
                return Ok(());
            }

            // A progress reset right after a submission means the vault
            // rejected the share.
            if status.progress == 0 {
                return Err(OrchestratorError::ProgressReset { key });
            }

            debug!(progress = status.progress, threshold = status.t, "unseal in progress");
            i += 1;
        }
    }

    /// Initialize the vault and persist the generated shares.
    ///
    /// Idempotent by refusal: unless `overwrite_existing` is set, any key
    /// this operation would write that already exists aborts it before the
    /// vault is touched. There is no rollback — a failure partway through
    /// share persistence leaves earlier shares in the keystore, and the
    /// caller must treat a failed init as having possibly mutated state.
    ///
    /// With `store_root_token` disabled the root token is emitted once via
    /// the log and is unrecoverable afterwards.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::InitPrecheck`] — keystore probe failed.
    /// - [`OrchestratorError::PreexistingKey`] — a target key exists (or
    ///   could not be verified absent) and overwriting is disabled.
    /// - [`OrchestratorError::VaultInit`] — the vault refused to initialize.
    /// - [`OrchestratorError::KeyPersist`] / [`OrchestratorError::RootPersist`]
    ///   — a share or the root token could not be stored.
    pub async fn init(&self) -> Result<(), OrchestratorError> {
        self.keystore
            .test(&self.test_key())
            .await
            .map_err(|source| OrchestratorError::InitPrecheck { source })?;

        if !self.options.overwrite_existing {
            // Exactly the key set written below: the root token key plus one
            // key per share index.
            let mut keys = vec![self.root_token_key()];
            keys.extend((0..self.options.secret_shares).map(|i| self.unseal_key(i)));

            for key in keys {
                if !self.key_absent(&key).await {
                    return Err(OrchestratorError::PreexistingKey { key });
                }
            }
        }

        let resp = self
            .client
            .init(self.options.secret_shares, self.options.secret_threshold)
            .await
            .map_err(|source| OrchestratorError::VaultInit { source })?;

        for (i, share) in resp.keys.iter().enumerate() {
            let key = self.unseal_key(u32::try_from(i).unwrap_or(u32::MAX));
            self.guarded_set(&key, share.as_bytes())
                .await
                .map_err(|source| OrchestratorError::KeyPersist {
                    key: key.clone(),
                    source,
                })?;
            debug!(key = %key, "stored unseal share");
        }

        if self.options.store_root_token {
            let key = self.root_token_key();
            self.guarded_set(&key, resp.root_token.as_bytes())
                .await
                .map_err(|source| OrchestratorError::RootPersist {
                    key: key.clone(),
                    source,
                })?;
            info!(key = %key, "root token stored in keystore");
        } else {
            // The only opportunity to capture the token — after this it is
            // gone for good.
            warn!(
                root_token = %resp.root_token,
                "not persisting root token; it grants full privileges to the vault and is shown here exactly once"
            );
        }

        Ok(())
    }

    /// Run the standalone keystore read/write diagnostic.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::AccessCheck`] wrapping the probe failure.
    pub async fn check_read_write_access(&self) -> Result<(), OrchestratorError> {
        info!("testing keystore read/write access");
        self.keystore
            .check_write_access()
            .await
            .map_err(|source| OrchestratorError::AccessCheck { source })?;
        info!("keystore read/write access ok");
        Ok(())
    }

    /// Whether `key` is verifiably absent. Lookup errors other than
    /// not-found count as "not absent" so the overwrite guard fails safe.
    async fn key_absent(&self, key: &str) -> bool {
        match self.keystore.get(key).await {
            Err(e) if e.is_not_found() => true,
            Err(e) => {
                warn!(key = %key, error = %e, "error checking whether key exists");
                false
            }
            Ok(_) => false,
        }
    }

    /// Write honoring the overwrite policy.
    async fn guarded_set(&self, key: &str, value: &[u8]) -> Result<(), KeyStoreError> {
        if !self.options.overwrite_existing && !self.key_absent(key).await {
            return Err(KeyStoreError::Write {
                key: key.to_owned(),
                reason: "key already exists and overwrite is disabled".to_owned(),
            });
        }
        self.keystore.set(key, value).await
    }

    // Key derivation is a pure function of prefix + index; these names are a
    // compatibility contract with previously stored shares.

    fn unseal_key(&self, i: u32) -> String {
        format!("{}-unseal-{i}", self.options.key_prefix)
    }

    fn root_token_key(&self) -> String {
        format!("{}-root", self.options.key_prefix)
    }

    fn test_key(&self) -> String {
        format!("{}-test", self.options.key_prefix)
    }
}

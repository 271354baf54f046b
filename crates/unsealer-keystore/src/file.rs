//! Local-directory keystore — one file per key.
//!
//! Intended for bare-metal or single-node deployments where shares live on
//! an encrypted volume. Keys map 1:1 to file names under the root directory,
//! so keys containing path separators or traversal components are rejected
//! rather than silently escaping the root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::{KeyStore, KeyStoreError};

/// A keystore backed by a directory of flat files.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    root: PathBuf,
}

impl FileKeyStore {
    /// Open a file keystore rooted at `root`, creating the directory if it
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Backend`] if the directory cannot be created.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, KeyStoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| KeyStoreError::Backend {
                reason: format!("failed to create keystore dir {}: {e}", root.display()),
            })?;
        Ok(Self { root })
    }

    /// Return the root directory of this keystore.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, KeyStoreError> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(KeyStoreError::Backend {
                reason: format!("invalid key name: '{key}'"),
            });
        }
        Ok(self.root.join(key))
    }
}

#[async_trait::async_trait]
impl KeyStore for FileKeyStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, KeyStoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(KeyStoreError::NotFound {
                key: key.to_owned(),
            }),
            Err(e) => Err(KeyStoreError::Read {
                key: key.to_owned(),
                reason: e.to_string(),
            }),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), KeyStoreError> {
        let path = self.path_for(key)?;
        // Write to a sibling temp file and rename so a crash mid-write never
        // leaves a truncated share behind.
        let tmp = self.root.join(format!(".{key}.tmp"));
        fs::write(&tmp, value)
            .await
            .map_err(|e| KeyStoreError::Write {
                key: key.to_owned(),
                reason: e.to_string(),
            })?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| KeyStoreError::Write {
                key: key.to_owned(),
                reason: e.to_string(),
            })
    }

    async fn delete(&self, key: &str) -> Result<(), KeyStoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KeyStoreError::Delete {
                key: key.to_owned(),
                reason: e.to_string(),
            }),
        }
    }
}

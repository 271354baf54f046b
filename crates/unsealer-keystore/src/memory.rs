//! In-memory keystore. Nothing persists — tests and local development only.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{KeyStore, KeyStoreError};

/// In-memory key-value store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKeyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys. Test helper.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl KeyStore for MemoryKeyStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, KeyStoreError> {
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| KeyStoreError::NotFound {
                key: key.to_owned(),
            })
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), KeyStoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KeyStoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

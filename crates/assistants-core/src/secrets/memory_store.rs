//! In-memory secret store

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::{SecretStore, SecretStoreResult};

/// In-memory secret store for tests and ephemeral use
///
/// # Example
///
/// ```
/// use assistants_core::secrets::{SecretStore, MemorySecretStore};
///
/// let store = MemorySecretStore::new().with_secret("upliftai", "sk-test");
/// assert_eq!(store.get("upliftai"), Some("sk-test".to_string()));
/// ```
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.write().insert(key.into(), value.into());
        self
    }

    pub fn clear(&self) {
        self.secrets.write().clear();
    }

    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.secrets.read().get(key).cloned()
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        self.secrets.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        self.secrets.write().remove(key);
        Ok(())
    }
}

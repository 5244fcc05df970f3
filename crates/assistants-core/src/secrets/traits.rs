//! Core trait for secret storage

use thiserror::Error;

/// Secret key of the API key for private assistants
pub const UPLIFTAI_SECRET: &str = "upliftai";

/// Errors that can occur during secret store operations
#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("Store is read-only")]
    ReadOnly,

    #[error("Store error: {0}")]
    Other(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// Trait for secret storage implementations
///
/// # Example
///
/// ```
/// use assistants_core::secrets::{SecretStore, EnvSecretStore};
///
/// let store = EnvSecretStore::new();
/// // store.get("upliftai") checks UPLIFTAI_API_KEY
/// ```
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Retrieve a secret by key
    fn get(&self, key: &str) -> Option<String>;

    /// Store a secret; read-only stores return `ReadOnly`
    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()>;

    fn delete(&self, key: &str) -> SecretStoreResult<()>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

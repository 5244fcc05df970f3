//! Environment variable secret store

use std::env;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult, UPLIFTAI_SECRET};

/// Environment variables consulted for a well-known secret key
fn env_vars_for(key: &str) -> &'static [&'static str] {
    if key.eq_ignore_ascii_case(UPLIFTAI_SECRET) {
        &["UPLIFTAI_API_KEY"]
    } else {
        &[]
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// Read-only secret store backed by environment variables
///
/// A key is tried as a variable name first, then through the well-known
/// mapping (`upliftai` → `UPLIFTAI_API_KEY`), then as `<KEY>_API_KEY`.
/// Empty variables count as unset.
#[derive(Debug, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        non_empty_var(key)
            .or_else(|| env_vars_for(key).iter().find_map(|name| non_empty_var(name)))
            .or_else(|| non_empty_var(&format!("{}_API_KEY", key.to_uppercase())))
    }

    fn store(&self, _key: &str, _value: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }

    fn delete(&self, _key: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }
}

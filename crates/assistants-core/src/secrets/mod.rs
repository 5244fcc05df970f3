//! Secret storage
//!
//! Only one secret matters to this crate: the API key used to open sessions
//! for private assistants. It is looked up under [`UPLIFTAI_SECRET`].

mod traits;
mod env_store;
mod memory_store;

pub use traits::{SecretStore, SecretStoreError, SecretStoreResult, UPLIFTAI_SECRET};
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;

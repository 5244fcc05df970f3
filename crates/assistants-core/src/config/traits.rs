//! Configuration provider trait

use async_trait::async_trait;

use super::settings::{SessionConfig, SessionSettings};

/// Configuration provider abstraction
///
/// Implementations:
/// - `MemoryConfigProvider`: In-memory for testing
/// - `FileConfigProvider`: YAML file (~/.config/assistants/config.yaml)
/// - Host adapters: read from the embedding application's settings
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Settings held by this source; unset fields are `None`
    async fn get_settings(&self) -> ConfigResult<SessionSettings>;

    /// Replace the settings held by this source
    async fn update_settings(&self, settings: SessionSettings) -> ConfigResult<()>;
}

/// Merge providers in order (later ones override earlier ones) and resolve
pub async fn resolve_config(providers: &[&dyn ConfigProvider]) -> ConfigResult<SessionConfig> {
    let mut merged = SessionSettings::default();
    for provider in providers {
        merged = merged.merge(provider.get_settings().await?);
    }
    merged.resolve()
}

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

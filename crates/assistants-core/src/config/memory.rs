//! In-memory configuration provider

use async_trait::async_trait;
use parking_lot::RwLock;

use super::settings::SessionSettings;
use super::traits::{ConfigProvider, ConfigResult};

/// In-memory configuration provider for testing
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    settings: RwLock<SessionSettings>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SessionSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    pub fn clear(&self) {
        *self.settings.write() = SessionSettings::default();
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfigProvider {
    async fn get_settings(&self) -> ConfigResult<SessionSettings> {
        Ok(self.settings.read().clone())
    }

    async fn update_settings(&self, settings: SessionSettings) -> ConfigResult<()> {
        *self.settings.write() = settings;
        Ok(())
    }
}

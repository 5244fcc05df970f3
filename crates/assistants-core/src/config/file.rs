//! File-based configuration provider (YAML)
//!
//! Supports user-level (~/.config/assistants/config.yaml) and workspace-level
//! (.config/assistants/config.yaml) config. Workspace values override user
//! values when both are passed to `resolve_config`.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::settings::SessionSettings;
use super::traits::{ConfigProvider, ConfigResult};

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/assistants/config.yaml)
    User,
    /// Workspace-level config (.config/assistants/config.yaml in workspace root)
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }
}

/// File-based configuration provider
///
/// Reads and writes session settings as YAML. A missing file reads as empty
/// settings. The parsed file is cached until `reload` or a save.
///
/// # Example
///
/// ```no_run
/// use assistants_core::config::FileConfigProvider;
///
/// let user_config = FileConfigProvider::user();
/// let workspace_config = FileConfigProvider::workspace("/path/to/workspace");
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<SessionSettings>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// Create a user-level config provider (~/.config/assistants/config.yaml)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("assistants").join("config.yaml"), ConfigLevel::User)
    }

    /// Create a workspace-level config provider (.config/assistants/config.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root
            .as_ref()
            .join(".config")
            .join("assistants")
            .join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> ConfigResult<SessionSettings> {
        if !self.path.exists() {
            return Ok(SessionSettings::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(SessionSettings::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn save(&self, settings: &SessionSettings) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, serde_yaml::to_string(settings)?)?;
        *self.cache.write() = Some(settings.clone());
        Ok(())
    }

    fn cached(&self) -> ConfigResult<SessionSettings> {
        if let Some(settings) = self.cache.read().as_ref() {
            return Ok(settings.clone());
        }
        self.reload()
    }

    /// Reload config from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<SessionSettings> {
        let settings = self.load()?;
        *self.cache.write() = Some(settings.clone());
        Ok(settings)
    }

    /// Copy the current file to `config.yaml.backup`
    pub fn backup(&self) -> ConfigResult<Option<PathBuf>> {
        if !self.exists() {
            return Ok(None);
        }

        let backup_path = self.path.with_extension("yaml.backup");
        fs::copy(&self.path, &backup_path)?;
        Ok(Some(backup_path))
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn get_settings(&self) -> ConfigResult<SessionSettings> {
        self.cached()
    }

    async fn update_settings(&self, settings: SessionSettings) -> ConfigResult<()> {
        self.save(&settings)
    }
}

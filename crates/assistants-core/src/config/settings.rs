//! Session settings as stored on disk and as resolved for use

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::traits::{ConfigError, ConfigResult};

pub const DEFAULT_API_BASE: &str = "https://api.upliftai.org";
pub const DEFAULT_PARTICIPANT_NAME: &str = "Test User";
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// One layer of settings. Unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_timeout_secs: Option<u64>,
}

impl SessionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_assistant_id(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = Some(assistant_id.into());
        self
    }

    pub fn with_participant_name(mut self, name: impl Into<String>) -> Self {
        self.participant_name = Some(name.into());
        self
    }

    pub fn with_rpc_timeout_secs(mut self, secs: u64) -> Self {
        self.rpc_timeout_secs = Some(secs);
        self
    }

    /// Overlay `other` on top of `self`; fields set in `other` win
    pub fn merge(self, other: SessionSettings) -> SessionSettings {
        SessionSettings {
            api_base: other.api_base.or(self.api_base),
            assistant_id: other.assistant_id.or(self.assistant_id),
            participant_name: other.participant_name.or(self.participant_name),
            rpc_timeout_secs: other.rpc_timeout_secs.or(self.rpc_timeout_secs),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == SessionSettings::default()
    }

    /// Fill defaults and validate
    pub fn resolve(self) -> ConfigResult<SessionConfig> {
        let api_base = self
            .api_base
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        if api_base.is_empty() {
            return Err(ConfigError::Invalid("api_base must not be empty".to_string()));
        }

        let rpc_timeout_secs = self.rpc_timeout_secs.unwrap_or(DEFAULT_RPC_TIMEOUT_SECS);
        if rpc_timeout_secs == 0 {
            return Err(ConfigError::Invalid("rpc_timeout_secs must be positive".to_string()));
        }

        Ok(SessionConfig {
            api_base,
            assistant_id: self.assistant_id.filter(|id| !id.trim().is_empty()),
            participant_name: self
                .participant_name
                .unwrap_or_else(|| DEFAULT_PARTICIPANT_NAME.to_string()),
            rpc_timeout_secs,
        })
    }
}

/// Resolved configuration with every default applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub api_base: String,
    pub assistant_id: Option<String>,
    pub participant_name: String,
    pub rpc_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            assistant_id: None,
            participant_name: DEFAULT_PARTICIPANT_NAME.to_string(),
            rpc_timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
        }
    }
}

impl SessionConfig {
    /// Response timeout for calls to the agent
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionSettings::new().resolve().unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.rpc_timeout(), Duration::from_secs(10));
        assert_eq!(config.participant_name, "Test User");
    }

    #[test]
    fn test_merge_prefers_overlay() {
        let user = SessionSettings::new()
            .with_api_base("https://user.example")
            .with_participant_name("Ada");
        let workspace = SessionSettings::new().with_api_base("https://workspace.example/");

        let config = user.merge(workspace).resolve().unwrap();
        assert_eq!(config.api_base, "https://workspace.example");
        assert_eq!(config.participant_name, "Ada");
    }

    #[test]
    fn test_invalid_values() {
        let zero = SessionSettings::new().with_rpc_timeout_secs(0).resolve();
        assert!(matches!(zero, Err(ConfigError::Invalid(_))));

        let blank_id = SessionSettings::new().with_assistant_id("  ").resolve().unwrap();
        assert!(blank_id.assistant_id.is_none());
    }

    #[test]
    fn test_yaml_field_names() {
        let settings: SessionSettings =
            serde_yaml::from_str("assistant_id: abc\nrpc_timeout_secs: 5\n").unwrap();
        assert_eq!(settings.assistant_id.as_deref(), Some("abc"));
        assert_eq!(settings.rpc_timeout_secs, Some(5));

        let yaml = serde_yaml::to_string(&SessionSettings::new().with_participant_name("Ada")).unwrap();
        assert_eq!(yaml.trim(), "participant_name: Ada");
    }
}

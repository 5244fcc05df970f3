//! Configuration provider abstractions
//!
//! Supports multiple configuration sources:
//! - `MemoryConfigProvider`: In-memory for testing
//! - `FileConfigProvider`: YAML file-based (user/workspace level)
//!
//! Sources hold partial `SessionSettings`; `resolve_config` layers them and
//! fills defaults into a `SessionConfig`.

mod traits;
mod settings;
mod memory;
mod file;

pub use traits::{resolve_config, ConfigProvider, ConfigError, ConfigResult};
pub use settings::{
    SessionConfig, SessionSettings, DEFAULT_API_BASE, DEFAULT_PARTICIPANT_NAME,
    DEFAULT_RPC_TIMEOUT_SECS,
};
pub use memory::MemoryConfigProvider;
pub use file::{FileConfigProvider, ConfigLevel};

//! Session error types

use thiserror::Error;

use crate::relay::RelayError;
use crate::tools::RegistryError;

/// Errors returned by session operations
///
/// `NoAgent`, `DuplicateTool` and `UnknownTool` are raised before any
/// transport call and leave the session untouched. `Relay` is raised after a
/// failed round trip, once the local handler set has been rolled back.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No agent participant found")]
    NoAgent,

    #[error("Tool {0} is already registered")]
    DuplicateTool(String),

    #[error("Tool {0} is not registered")]
    UnknownTool(String),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl From<RegistryError> for SessionError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateTool(name) => SessionError::DuplicateTool(name),
            RegistryError::UnknownTool(name) => SessionError::UnknownTool(name),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

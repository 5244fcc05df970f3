//! Transport error types

use std::time::Duration;

use thiserror::Error;

/// RPC error code for a failure inside the invoked method
pub const APPLICATION_ERROR_CODE: i64 = 1500;

/// RPC error code for a method the receiver does not handle
pub const UNSUPPORTED_METHOD_CODE: i64 = 1400;

/// Errors raised by a room transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Room is not connected")]
    NotConnected,

    #[error("Participant not found: {0}")]
    UnknownDestination(String),

    #[error("RPC method already registered: {0}")]
    MethodAlreadyRegistered(String),

    #[error("Response timeout after {0:?}")]
    Timeout(Duration),

    /// The remote side answered with an error
    #[error("RPC error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn remote(code: i64, message: impl Into<String>) -> Self {
        Self::Remote {
            code,
            message: message.into(),
        }
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::remote(APPLICATION_ERROR_CODE, message)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

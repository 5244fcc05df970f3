//! Session issuer errors

use thiserror::Error;

/// Errors from the session endpoint
#[derive(Error, Debug)]
pub enum IssueError {
    #[error("Assistant ID must not be empty")]
    EmptyAssistantId,

    #[error("Assistant not found: {0}")]
    AssistantNotFound(String),

    #[error("Assistant {0} is not public")]
    AssistantNotPublic(String),

    #[error("Request was not authorized (status {status})")]
    Unauthorized { status: u16 },

    #[error("No API key available for private sessions")]
    MissingApiKey,

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Session request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid session response: {0}")]
    InvalidResponse(String),
}

impl IssueError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        IssueError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        IssueError::InvalidResponse(message.into())
    }

    /// Worth asking the user to try again
    pub fn is_retryable(&self) -> bool {
        matches!(self, IssueError::Status { .. } | IssueError::Http(_))
    }

    /// Message suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            IssueError::EmptyAssistantId => "Please enter an Assistant ID.".to_string(),
            IssueError::AssistantNotFound(_) => {
                "Assistant not found. Please check your Assistant ID.".to_string()
            }
            IssueError::AssistantNotPublic(_) => "This assistant is not public. If this is your \
                 assistant, please ensure public access is enabled before using it here."
                .to_string(),
            IssueError::Status { status, .. } => {
                format!("Failed to create session (Error {}). Please try again.", status)
            }
            IssueError::Http(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type IssueResult<T> = Result<T, IssueError>;

//! Tool handler abstraction

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::ToolInvocation;

/// Errors a tool handler can report back to the agent
#[derive(Error, Debug)]
pub enum ToolError {
    /// The agent sent a payload the tool could not understand
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The tool ran and failed
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Code that runs when the agent invokes a tool.
///
/// Returns the JSON string sent back as the RPC response, conventionally a
/// serialized `ToolResponse`.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, invocation: ToolInvocation) -> ToolResult<String>;
}

/// Type alias for an Arc-wrapped handler
pub type SharedToolHandler = Arc<dyn ToolHandler>;

/// Adapter that turns an async closure into a `ToolHandler`
pub struct FnToolHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> ToolHandler for FnToolHandler<F>
where
    F: Fn(ToolInvocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult<String>> + Send + 'static,
{
    async fn call(&self, invocation: ToolInvocation) -> ToolResult<String> {
        (self.f)(invocation).await
    }
}

/// Wrap an async closure as a shared handler
pub fn handler_fn<F, Fut>(f: F) -> SharedToolHandler
where
    F: Fn(ToolInvocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult<String>> + Send + 'static,
{
    Arc::new(FnToolHandler { f })
}

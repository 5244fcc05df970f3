//! Assistants Core
//!
//! Keeps the tools a real-time voice agent may call in step with the host
//! application. The host defines tools (name, JSON-schema parameters, async
//! handler); the session registers each handler as an RPC method on the room
//! and tells the agent participant about the change over RPC.
//!
//! The room itself sits behind the [`RoomTransport`] trait. [`LoopbackRoom`]
//! is an in-memory implementation for tests and demos.
//!
//! ```rust,ignore
//! use assistants_core::{AssistantSession, LoopbackRoom, ToolDefinition};
//!
//! let room = Arc::new(LoopbackRoom::new("user"));
//! let session = AssistantSession::builder(room.clone())
//!     .with_initial_tools([get_weather()])
//!     .build();
//!
//! // Drive from room events; the initial tools are announced once an agent joins
//! let events = room.subscribe();
//! tokio::spawn(async move { session.run(events).await });
//!
//! session.add_tool(random_joke_maker()).await?;
//! session.update_instruction("Keep answers short").await?;
//! ```
//!
//! Session credentials for joining a room come from [`SessionIssuer`].

pub mod types;
pub mod tools;
pub mod transport;
pub mod relay;
pub mod session;
pub mod issuer;
pub mod config;
pub mod secrets;
pub mod logging;

pub use types::{
    InstructionsUpdate, MutationAction, ParameterConfig, ParameterType, RegistryMutation,
    ToolDefinition, ToolInvocation, ToolParameters, ToolResponse, WireTool,
};

pub use tools::{handler_fn, SharedToolHandler, ToolError, ToolHandler, ToolRegistry, ToolResult};

pub use transport::{
    ConnectionState, LoopbackRoom, ParticipantInfo, ParticipantKind, RoomEvent, RoomTransport,
    RpcBehavior, TransportError,
};

pub use relay::{RelayError, ToolRelay};

pub use session::{AssistantSession, SessionBuilder, SessionError, SessionPhase, SessionResult};

pub use issuer::{IssueError, SessionCredentials, SessionIssuer};

pub use config::{
    resolve_config, ConfigProvider, FileConfigProvider, MemoryConfigProvider, SessionConfig,
    SessionSettings,
};

pub use secrets::{EnvSecretStore, MemorySecretStore, SecretStore};

pub use logging::{ConsoleLogger, FanoutLogger, FileLogger, Logger, NoOpLogger};

//! Core types shared by the registry, relay and session
//!
//! Tool definitions, inbound invocations, and the JSON envelopes exchanged
//! with the agent.

mod envelope;
mod invocation;
mod tool;

pub use envelope::{
    InstructionsUpdate, MutationAction, RegistryMutation, UPDATE_INSTRUCTIONS_METHOD,
    UPDATE_TOOLS_METHOD,
};
pub use invocation::{ToolInvocation, ToolResponse};
pub use tool::{
    ParameterConfig, ParameterType, ToolDefinition, ToolParameters, WireTool,
    DEFAULT_TOOL_TIMEOUT_SECS,
};

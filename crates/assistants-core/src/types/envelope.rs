//! Wire envelopes sent to the agent over RPC

use serde::{Deserialize, Serialize};

use super::tool::{ToolDefinition, WireTool};

/// RPC method on the agent that receives registry mutations
pub const UPDATE_TOOLS_METHOD: &str = "update_tools";

/// RPC method on the agent that receives instruction updates
pub const UPDATE_INSTRUCTIONS_METHOD: &str = "update_instructions";

/// Kind of registry change being announced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationAction {
    Add,
    Remove,
    Replace,
}

/// Payload of an `update_tools` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryMutation {
    pub action: MutationAction,
    pub tools: Vec<WireTool>,
}

impl RegistryMutation {
    pub fn new<'a>(action: MutationAction, tools: impl IntoIterator<Item = &'a ToolDefinition>) -> Self {
        Self {
            action,
            tools: tools.into_iter().map(ToolDefinition::to_wire).collect(),
        }
    }

    pub fn add<'a>(tools: impl IntoIterator<Item = &'a ToolDefinition>) -> Self {
        Self::new(MutationAction::Add, tools)
    }

    pub fn remove<'a>(tools: impl IntoIterator<Item = &'a ToolDefinition>) -> Self {
        Self::new(MutationAction::Remove, tools)
    }

    pub fn replace<'a>(tools: impl IntoIterator<Item = &'a ToolDefinition>) -> Self {
        Self::new(MutationAction::Replace, tools)
    }

    /// Names of the tools carried, in order
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_payload(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

/// Payload of an `update_instructions` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionsUpdate {
    pub instructions: String,
}

impl InstructionsUpdate {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }

    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

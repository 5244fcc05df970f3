//! Inbound tool invocation and the conventional reply shape

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tools::{ToolError, ToolResult};

/// One inbound call from the agent, built by the transport
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub request_id: String,
    pub caller_identity: String,
    /// JSON-encoded payload as sent by the agent
    pub payload: String,
    pub response_timeout: Duration,
}

impl ToolInvocation {
    pub fn new(
        request_id: impl Into<String>,
        caller_identity: impl Into<String>,
        payload: impl Into<String>,
        response_timeout: Duration,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            caller_identity: caller_identity.into(),
            payload: payload.into(),
            response_timeout,
        }
    }

    /// Parse the payload as JSON
    pub fn payload_json(&self) -> ToolResult<Value> {
        serde_json::from_str(&self.payload).map_err(|e| ToolError::invalid_payload(e.to_string()))
    }

    /// Decode the call arguments into `T`.
    ///
    /// The agent sends `{"arguments": {"raw_arguments": {...}}}`. A bare
    /// `arguments` object is accepted too, and `raw_arguments` may itself be a
    /// JSON-encoded string.
    pub fn arguments<T: DeserializeOwned>(&self) -> ToolResult<T> {
        let payload = self.payload_json()?;
        let arguments = payload
            .get("arguments")
            .ok_or_else(|| ToolError::invalid_payload("missing `arguments`"))?;

        let raw = match arguments.get("raw_arguments") {
            Some(Value::String(encoded)) => serde_json::from_str(encoded)
                .map_err(|e| ToolError::invalid_payload(format!("raw_arguments: {}", e)))?,
            Some(value) => value.clone(),
            None => arguments.clone(),
        };

        serde_json::from_value(raw).map_err(|e| ToolError::invalid_payload(e.to_string()))
    }
}

/// Conventional JSON reply of a tool handler:
/// `{ result | error, presentationInstructions?, ...extra }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Tells the agent how to voice the outcome
    #[serde(rename = "presentationInstructions", skip_serializing_if = "Option::is_none")]
    pub presentation_instructions: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolResponse {
    pub fn success(result: Value) -> Self {
        Self {
            result: Some(result),
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_presentation(mut self, instructions: impl Into<String>) -> Self {
        self.presentation_instructions = Some(instructions.into());
        self
    }

    /// Attach an extra top-level field (e.g. `joke`)
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Encode as the JSON string returned to the agent
    pub fn to_json(&self) -> ToolResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

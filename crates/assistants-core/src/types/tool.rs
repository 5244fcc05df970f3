//! Tool definition types
//!
//! A `ToolDefinition` is what the host registers: a name, a description, a
//! parameter schema the agent uses to build arguments, a timeout, and the
//! handler that runs when the agent invokes it. Only the first four cross the
//! wire (see `WireTool`); the handler stays local.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::{handler_fn, SharedToolHandler, ToolResult};
use crate::types::ToolInvocation;

/// Default agent-side timeout for a tool call, in seconds
pub const DEFAULT_TOOL_TIMEOUT_SECS: f64 = 10.0;

/// JSON-schema primitive type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// Schema for a single tool parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterConfig {
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Element schema for `array` parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ParameterConfig>>,
    /// Nested properties for `object` parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, ParameterConfig>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ParameterConfig {
    /// Create a parameter of the given type with no description
    pub fn new(param_type: ParameterType) -> Self {
        Self {
            param_type,
            description: None,
            enum_values: None,
            items: None,
            properties: None,
            required: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::new(ParameterType::String).with_description(description)
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::new(ParameterType::Number).with_description(description)
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self::new(ParameterType::Integer).with_description(description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new(ParameterType::Boolean).with_description(description)
    }

    /// Array parameter whose elements follow `items`
    pub fn array(items: ParameterConfig) -> Self {
        let mut param = Self::new(ParameterType::Array);
        param.items = Some(Box::new(items));
        param
    }

    /// Object parameter with nested properties
    pub fn object(properties: BTreeMap<String, ParameterConfig>, required: Vec<String>) -> Self {
        let mut param = Self::new(ParameterType::Object);
        param.properties = Some(properties);
        param.required = Some(required);
        param
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Restrict the parameter to a fixed set of values
    pub fn with_enum(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }
}

/// Top-level parameter schema of a tool (always an object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub schema_type: ParameterType,
    #[serde(default)]
    pub properties: BTreeMap<String, ParameterConfig>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for ToolParameters {
    fn default() -> Self {
        Self {
            schema_type: ParameterType::Object,
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

impl ToolParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property, optionally marking it required
    pub fn with_property(mut self, name: impl Into<String>, config: ParameterConfig, required: bool) -> Self {
        let name = name.into();
        if required && !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, config);
        self
    }

    /// Convert a raw JSON schema into typed parameters
    pub fn from_schema(schema: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(schema)
    }
}

/// A tool the host exposes to the agent
#[derive(Clone)]
pub struct ToolDefinition {
    /// Unique name; also the RPC method name the agent invokes
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
    /// Agent-side timeout in seconds; fractions are allowed
    pub timeout_secs: f64,
    pub handler: SharedToolHandler,
}

impl ToolDefinition {
    /// Create a tool with an empty parameter schema and the default timeout
    pub fn new(name: impl Into<String>, description: impl Into<String>, handler: SharedToolHandler) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ToolParameters::default(),
            timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
            handler,
        }
    }

    /// Create a tool from an async closure
    pub fn from_fn<F, Fut>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(ToolInvocation) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ToolResult<String>> + Send + 'static,
    {
        Self::new(name, description, handler_fn(f))
    }

    pub fn with_parameters(mut self, parameters: ToolParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Add a single parameter to the schema
    pub fn with_parameter(mut self, name: impl Into<String>, config: ParameterConfig, required: bool) -> Self {
        self.parameters = self.parameters.with_property(name, config, required);
        self
    }

    pub fn with_timeout(mut self, timeout_secs: f64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Same tool with a different handler
    pub fn with_handler(mut self, handler: SharedToolHandler) -> Self {
        self.handler = handler;
        self
    }

    /// The serializable part of this tool, as sent to the agent
    pub fn to_wire(&self) -> WireTool {
        WireTool {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
            timeout: self.timeout_secs,
        }
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// Tool as it appears inside an `update_tools` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTool {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
    /// Seconds
    pub timeout: f64,
}

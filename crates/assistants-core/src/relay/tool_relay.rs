//! Relay between the local tool registry and the agent participant

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::logging::Logger;
use crate::transport::{RoomTransport, RpcRequest, TransportError};
use crate::types::{
    InstructionsUpdate, RegistryMutation, ToolDefinition, UPDATE_INSTRUCTIONS_METHOD,
    UPDATE_TOOLS_METHOD,
};

/// Default response timeout for calls to the agent
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while relaying to the agent
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Failed to encode {method} payload: {source}")]
    Encode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{method} call to {destination} failed: {source}")]
    Call {
        method: &'static str,
        destination: String,
        #[source]
        source: TransportError,
    },

    #[error("Failed to register handler for {tool}: {source}")]
    Bind {
        tool: String,
        #[source]
        source: TransportError,
    },

    #[error("Failed to unregister handler for {tool}: {source}")]
    Unbind {
        tool: String,
        #[source]
        source: TransportError,
    },
}

impl RelayError {
    /// The transport failure behind this error, if any
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            RelayError::Encode { .. } => None,
            RelayError::Call { source, .. }
            | RelayError::Bind { source, .. }
            | RelayError::Unbind { source, .. } => Some(source),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.transport_error().is_some_and(TransportError::is_timeout)
    }
}

pub type RelayResult<T> = Result<T, RelayError>;

/// Sends registry mutations and instructions to the agent, and manages the
/// local RPC methods that let the agent invoke tools.
///
/// Every call is a single round trip on the transport; there is no retry and
/// no cancellation once a call is in flight.
pub struct ToolRelay {
    transport: Arc<dyn RoomTransport>,
    response_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl ToolRelay {
    pub fn new(transport: Arc<dyn RoomTransport>, logger: Arc<dyn Logger>) -> Self {
        Self {
            transport,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            logger,
        }
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    async fn call(&self, destination: &str, method: &'static str, payload: String) -> RelayResult<String> {
        let request = RpcRequest {
            destination_identity: destination.to_string(),
            method: method.to_string(),
            payload,
            response_timeout: self.response_timeout,
        };

        self.transport.perform_rpc(request).await.map_err(|source| {
            self.logger.error(&format!(
                "[ToolRelay] {} call to {} failed: {}",
                method, destination, source
            ));
            RelayError::Call {
                method,
                destination: destination.to_string(),
                source,
            }
        })
    }

    /// Send a registry mutation to the agent (`update_tools`)
    pub async fn announce(&self, agent_identity: &str, mutation: &RegistryMutation) -> RelayResult<()> {
        let payload = mutation.to_payload().map_err(|source| RelayError::Encode {
            method: UPDATE_TOOLS_METHOD,
            source,
        })?;

        self.logger.debug(&format!(
            "[ToolRelay] Announcing {:?} of [{}] to {}",
            mutation.action,
            mutation.tool_names().join(", "),
            agent_identity
        ));
        self.call(agent_identity, UPDATE_TOOLS_METHOD, payload).await?;
        Ok(())
    }

    /// Replace the agent's instructions (`update_instructions`)
    pub async fn send_instructions(&self, agent_identity: &str, instructions: &str) -> RelayResult<()> {
        let payload = InstructionsUpdate::new(instructions)
            .to_payload()
            .map_err(|source| RelayError::Encode {
                method: UPDATE_INSTRUCTIONS_METHOD,
                source,
            })?;

        self.logger.debug(&format!(
            "[ToolRelay] Sending instructions to {} ({} chars)",
            agent_identity,
            instructions.len()
        ));
        self.call(agent_identity, UPDATE_INSTRUCTIONS_METHOD, payload).await?;
        Ok(())
    }

    /// Make the tool invocable by the agent under its name
    pub async fn bind_handler(&self, tool: &ToolDefinition) -> RelayResult<()> {
        self.transport
            .register_rpc_method(&tool.name, tool.handler.clone())
            .await
            .map_err(|source| RelayError::Bind {
                tool: tool.name.clone(),
                source,
            })?;
        self.logger.debug(&format!("[ToolRelay] Bound handler for {}", tool.name));
        Ok(())
    }

    /// Stop serving the tool's RPC method
    pub async fn unbind_handler(&self, name: &str) -> RelayResult<()> {
        self.transport
            .unregister_rpc_method(name)
            .await
            .map_err(|source| RelayError::Unbind {
                tool: name.to_string(),
                source,
            })?;
        self.logger.debug(&format!("[ToolRelay] Unbound handler for {}", name));
        Ok(())
    }
}

impl std::fmt::Debug for ToolRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRelay")
            .field("response_timeout", &self.response_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::transport::{LoopbackRoom, RpcBehavior};
    use crate::types::MutationAction;

    fn setup() -> (Arc<LoopbackRoom>, ToolRelay) {
        let room = Arc::new(LoopbackRoom::new("user"));
        room.connect();
        room.join_agent("agent-1");
        let relay = ToolRelay::new(room.clone(), Arc::new(NoOpLogger::new()));
        (room, relay)
    }

    fn tool(name: &str) -> ToolDefinition {
        ToolDefinition::from_fn(name, "test", |_inv| async { Ok("done".to_string()) })
    }

    #[tokio::test]
    async fn test_announce_sends_one_update_tools_call() {
        let (room, relay) = setup();
        let tools = [tool("get_weather")];

        relay.announce("agent-1", &RegistryMutation::add(&tools)).await.unwrap();

        let calls = room.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "update_tools");
        assert_eq!(calls[0].destination_identity, "agent-1");

        let updates = room.tool_updates();
        assert_eq!(updates[0].action, MutationAction::Add);
        assert_eq!(updates[0].tool_names(), vec!["get_weather"]);
    }

    #[tokio::test]
    async fn test_send_instructions_payload() {
        let (room, relay) = setup();
        relay.send_instructions("agent-1", "Be brief").await.unwrap();

        let calls = room.calls_to("update_instructions");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].payload, r#"{"instructions":"Be brief"}"#);
    }

    #[tokio::test]
    async fn test_announce_failure_is_relay_error() {
        let (room, relay) = setup();
        room.fail_next_rpc("agent busy");

        let err = relay
            .announce("agent-1", &RegistryMutation::replace(&[tool("a")]))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Call { method: "update_tools", .. }));
        assert!(err.to_string().contains("agent busy"));
    }

    #[tokio::test]
    async fn test_announce_to_absent_agent() {
        let (room, relay) = setup();
        room.leave("agent-1");

        let err = relay.send_instructions("agent-1", "hello").await.unwrap_err();
        assert!(matches!(
            err.transport_error(),
            Some(TransportError::UnknownDestination(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_uses_configured_response_timeout() {
        let (room, relay) = setup();
        let relay = relay.with_response_timeout(Duration::from_secs(2));
        room.push_behavior(RpcBehavior::Delay(Duration::from_secs(3)));

        let err = relay.send_instructions("agent-1", "hello").await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_bind_and_unbind() {
        let (room, relay) = setup();
        let weather = tool("get_weather");

        relay.bind_handler(&weather).await.unwrap();
        assert!(room.is_registered("get_weather"));
        assert_eq!(room.invoke_local("get_weather", "{}").await.unwrap(), "done");

        let dup = relay.bind_handler(&weather).await.unwrap_err();
        assert!(matches!(dup, RelayError::Bind { ref tool, .. } if tool == "get_weather"));

        relay.unbind_handler("get_weather").await.unwrap();
        assert!(!room.is_registered("get_weather"));
    }
}

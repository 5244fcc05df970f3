//! Room transport trait definition

use std::time::Duration;

use async_trait::async_trait;

use super::error::TransportResult;
use crate::tools::SharedToolHandler;

/// Connection state of the underlying room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Role a participant plays in the room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticipantKind {
    #[default]
    Standard,
    Agent,
    Sip,
    Ingress,
    Egress,
}

/// Snapshot of a remote participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub identity: String,
    pub kind: ParticipantKind,
}

impl ParticipantInfo {
    pub fn new(identity: impl Into<String>, kind: ParticipantKind) -> Self {
        Self {
            identity: identity.into(),
            kind,
        }
    }

    pub fn agent(identity: impl Into<String>) -> Self {
        Self::new(identity, ParticipantKind::Agent)
    }

    pub fn standard(identity: impl Into<String>) -> Self {
        Self::new(identity, ParticipantKind::Standard)
    }

    pub fn is_agent(&self) -> bool {
        self.kind == ParticipantKind::Agent
    }
}

/// Events a room emits that the session reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    ConnectionStateChanged(ConnectionState),
    ParticipantConnected(ParticipantInfo),
    ParticipantDisconnected(ParticipantInfo),
    /// The room closed for good
    Disconnected,
}

/// Outbound RPC request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    pub destination_identity: String,
    pub method: String,
    pub payload: String,
    pub response_timeout: Duration,
}

/// Handler the transport runs for an inbound RPC method
pub type RpcHandler = SharedToolHandler;

/// Room transport abstraction
///
/// The room library owns connection establishment, media, and RPC delivery.
/// This trait is the slice of it the session needs:
/// - connection state and the remote participant list
/// - request/response calls to a participant
/// - registration of local methods remote participants can call
///
/// Implementations:
/// - `LoopbackRoom`: in-memory room for tests and the demo
/// - WebRTC room adapters in host applications
#[async_trait]
pub trait RoomTransport: Send + Sync {
    fn connection_state(&self) -> ConnectionState;

    /// Identity of the local participant
    fn local_identity(&self) -> String;

    /// Remote participants in join order
    fn remote_participants(&self) -> Vec<ParticipantInfo>;

    /// Call `method` on a remote participant and wait for its reply
    async fn perform_rpc(&self, request: RpcRequest) -> TransportResult<String>;

    /// Make `method` callable by remote participants.
    ///
    /// Fails with `MethodAlreadyRegistered` if the name is taken.
    async fn register_rpc_method(&self, method: &str, handler: RpcHandler) -> TransportResult<()>;

    /// Stop serving `method`. Unknown names are ignored.
    async fn unregister_rpc_method(&self, method: &str) -> TransportResult<()>;
}

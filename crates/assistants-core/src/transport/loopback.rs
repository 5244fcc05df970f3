//! In-memory room for testing
//!
//! Provides a deterministic room without network dependencies. The test (or
//! the demo) plays the part of the remote agent: it scripts how outbound calls
//! are answered, inspects what was sent, and invokes locally registered tools.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use super::error::{
    TransportError, TransportResult, APPLICATION_ERROR_CODE, UNSUPPORTED_METHOD_CODE,
};
use super::traits::{
    ConnectionState, ParticipantInfo, RoomEvent, RoomTransport, RpcHandler, RpcRequest,
};
use crate::logging::{Logger, NoOpLogger};
use crate::types::{RegistryMutation, ToolInvocation, UPDATE_TOOLS_METHOD};

/// Response timeout used for simulated inbound calls
const INBOUND_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// How the simulated remote side answers an outbound call
#[derive(Debug, Clone)]
pub enum RpcBehavior {
    /// Reply immediately with a payload
    Respond(String),
    /// Reply with an RPC error
    Reject { code: i64, message: String },
    /// Reply with an empty payload after a delay, subject to the response timeout
    Delay(Duration),
    /// Never reply; the call times out
    Hang,
}

impl Default for RpcBehavior {
    fn default() -> Self {
        RpcBehavior::Respond(String::new())
    }
}

/// An outbound call as the remote side saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub destination_identity: String,
    pub method: String,
    pub payload: String,
}

#[derive(Debug, Default)]
struct RoomState {
    connection: ConnectionState,
    participants: Vec<ParticipantInfo>,
}

/// In-memory `RoomTransport`
pub struct LoopbackRoom {
    local_identity: String,
    state: RwLock<RoomState>,
    methods: RwLock<HashMap<String, RpcHandler>>,
    calls: Mutex<Vec<RecordedCall>>,
    behaviors: Mutex<VecDeque<RpcBehavior>>,
    stuck_methods: Mutex<HashSet<String>>,
    events: Mutex<Option<mpsc::UnboundedSender<RoomEvent>>>,
    request_id: AtomicU64,
    logger: Arc<dyn Logger>,
}

impl LoopbackRoom {
    /// Create a disconnected room for the given local identity
    pub fn new(local_identity: impl Into<String>) -> Self {
        Self::with_logger(local_identity, Arc::new(NoOpLogger::new()))
    }

    pub fn with_logger(local_identity: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            local_identity: local_identity.into(),
            state: RwLock::new(RoomState::default()),
            methods: RwLock::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            behaviors: Mutex::new(VecDeque::new()),
            stuck_methods: Mutex::new(HashSet::new()),
            events: Mutex::new(None),
            request_id: AtomicU64::new(0),
            logger,
        }
    }

    /// Subscribe to room events. A new subscription replaces the previous one.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<RoomEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock() = Some(tx);
        rx
    }

    fn emit(&self, event: RoomEvent) {
        let events = self.events.lock();
        if let Some(tx) = events.as_ref() {
            // A dropped receiver just means nobody is listening
            let _ = tx.send(event);
        }
    }

    /// Start connecting; outbound calls still fail until `connect`
    pub fn begin_connect(&self) {
        self.state.write().connection = ConnectionState::Connecting;
        self.emit(RoomEvent::ConnectionStateChanged(ConnectionState::Connecting));
    }

    pub fn connect(&self) {
        self.state.write().connection = ConnectionState::Connected;
        self.logger.debug(&format!("[LoopbackRoom] {} connected", self.local_identity));
        self.emit(RoomEvent::ConnectionStateChanged(ConnectionState::Connected));
    }

    /// Move to `Reconnecting` without dropping participants
    pub fn interrupt(&self) {
        self.state.write().connection = ConnectionState::Reconnecting;
        self.emit(RoomEvent::ConnectionStateChanged(ConnectionState::Reconnecting));
    }

    /// Close the room: participants leave and local methods are dropped
    pub fn disconnect(&self) {
        {
            let mut state = self.state.write();
            state.connection = ConnectionState::Disconnected;
            state.participants.clear();
        }
        self.methods.write().clear();
        self.logger.debug(&format!("[LoopbackRoom] {} disconnected", self.local_identity));
        self.emit(RoomEvent::Disconnected);
    }

    /// A remote participant joins
    pub fn join(&self, participant: ParticipantInfo) {
        self.state.write().participants.push(participant.clone());
        self.emit(RoomEvent::ParticipantConnected(participant));
    }

    /// An agent participant joins
    pub fn join_agent(&self, identity: impl Into<String>) {
        self.join(ParticipantInfo::agent(identity));
    }

    /// A remote participant leaves; unknown identities are ignored
    pub fn leave(&self, identity: &str) {
        let removed = {
            let mut state = self.state.write();
            let pos = state.participants.iter().position(|p| p.identity == identity);
            pos.map(|pos| state.participants.remove(pos))
        };
        if let Some(participant) = removed {
            self.emit(RoomEvent::ParticipantDisconnected(participant));
        }
    }

    /// Queue how the next outbound call is answered
    pub fn push_behavior(&self, behavior: RpcBehavior) {
        self.behaviors.lock().push_back(behavior);
    }

    /// Make the next outbound call fail with an application error
    pub fn fail_next_rpc(&self, message: impl Into<String>) {
        self.push_behavior(RpcBehavior::Reject {
            code: APPLICATION_ERROR_CODE,
            message: message.into(),
        });
    }

    /// Make the next attempt to unregister `method` fail
    pub fn fail_next_unregister(&self, method: impl Into<String>) {
        self.stuck_methods.lock().insert(method.into());
    }

    /// Every outbound call so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls.lock().iter().filter(|c| c.method == method).cloned().collect()
    }

    /// Decoded payloads of every `update_tools` call
    pub fn tool_updates(&self) -> Vec<RegistryMutation> {
        self.calls_to(UPDATE_TOOLS_METHOD)
            .iter()
            .filter_map(|c| RegistryMutation::from_payload(&c.payload).ok())
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Locally registered method names, sorted
    pub fn registered_methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_registered(&self, method: &str) -> bool {
        self.methods.read().contains_key(method)
    }

    /// Invoke a locally registered method as the first agent in the room would
    pub async fn invoke_local(&self, method: &str, payload: impl Into<String>) -> TransportResult<String> {
        let handler = self
            .methods
            .read()
            .get(method)
            .cloned()
            .ok_or_else(|| TransportError::remote(UNSUPPORTED_METHOD_CODE, format!("Method {} not supported", method)))?;

        let caller = self
            .state
            .read()
            .participants
            .iter()
            .find(|p| p.is_agent())
            .map(|p| p.identity.clone())
            .unwrap_or_else(|| "agent".to_string());

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let invocation = ToolInvocation::new(format!("req-{}", id), caller, payload, INBOUND_RESPONSE_TIMEOUT);

        self.logger.debug(&format!("[LoopbackRoom] Invoking local method {}", method));
        handler
            .call(invocation)
            .await
            .map_err(|e| TransportError::application(e.to_string()))
    }
}

impl std::fmt::Debug for LoopbackRoom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackRoom")
            .field("local_identity", &self.local_identity)
            .field("connection", &self.connection_state())
            .field("methods", &self.registered_methods())
            .finish()
    }
}

#[async_trait]
impl RoomTransport for LoopbackRoom {
    fn connection_state(&self) -> ConnectionState {
        self.state.read().connection
    }

    fn local_identity(&self) -> String {
        self.local_identity.clone()
    }

    fn remote_participants(&self) -> Vec<ParticipantInfo> {
        self.state.read().participants.clone()
    }

    async fn perform_rpc(&self, request: RpcRequest) -> TransportResult<String> {
        {
            let state = self.state.read();
            if state.connection != ConnectionState::Connected {
                return Err(TransportError::NotConnected);
            }
            if !state.participants.iter().any(|p| p.identity == request.destination_identity) {
                return Err(TransportError::UnknownDestination(request.destination_identity));
            }
        }

        self.logger.debug(&format!(
            "[LoopbackRoom] RPC {} -> {} ({} bytes)",
            request.method,
            request.destination_identity,
            request.payload.len()
        ));
        self.calls.lock().push(RecordedCall {
            destination_identity: request.destination_identity.clone(),
            method: request.method.clone(),
            payload: request.payload.clone(),
        });

        let behavior = self.behaviors.lock().pop_front().unwrap_or_default();
        match behavior {
            RpcBehavior::Respond(reply) => Ok(reply),
            RpcBehavior::Reject { code, message } => Err(TransportError::remote(code, message)),
            RpcBehavior::Delay(delay) => {
                tokio::time::timeout(request.response_timeout, tokio::time::sleep(delay))
                    .await
                    .map_err(|_| TransportError::Timeout(request.response_timeout))?;
                Ok(String::new())
            }
            RpcBehavior::Hang => {
                tokio::time::sleep(request.response_timeout).await;
                Err(TransportError::Timeout(request.response_timeout))
            }
        }
    }

    async fn register_rpc_method(&self, method: &str, handler: RpcHandler) -> TransportResult<()> {
        let mut methods = self.methods.write();
        if methods.contains_key(method) {
            return Err(TransportError::MethodAlreadyRegistered(method.to_string()));
        }
        methods.insert(method.to_string(), handler);
        Ok(())
    }

    async fn unregister_rpc_method(&self, method: &str) -> TransportResult<()> {
        if self.stuck_methods.lock().remove(method) {
            return Err(TransportError::Other(format!("Could not unregister {}", method)));
        }
        self.methods.write().remove(method);
        Ok(())
    }
}

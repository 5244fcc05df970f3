//! Tool session bound to a room and its agent participant

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use super::error::{SessionError, SessionResult};
use super::saga::Saga;
use super::state::{select_agent, SessionPhase, SessionStatus};
use crate::config::SessionConfig;
use crate::logging::{Logger, NoOpLogger};
use crate::relay::{ToolRelay, DEFAULT_RESPONSE_TIMEOUT};
use crate::tools::{RegistryResult, ToolRegistry};
use crate::transport::{ConnectionState, RoomEvent, RoomTransport};
use crate::types::{RegistryMutation, ToolDefinition};

/// Called with the full tool list after every change to the registry
pub type ToolsChangeCallback = Box<dyn Fn(&[ToolDefinition]) + Send + Sync>;

/// Called with `(connected, agent_identity)` when either changes
pub type ConnectionChangeCallback = Box<dyn Fn(bool, Option<&str>) + Send + Sync>;

/// Builder for [`AssistantSession`]
pub struct SessionBuilder {
    transport: Arc<dyn RoomTransport>,
    initial_tools: Vec<ToolDefinition>,
    response_timeout: Duration,
    on_tools_change: Option<ToolsChangeCallback>,
    on_connection_change: Option<ConnectionChangeCallback>,
    logger: Arc<dyn Logger>,
}

impl SessionBuilder {
    fn new(transport: Arc<dyn RoomTransport>) -> Self {
        Self {
            transport,
            initial_tools: Vec::new(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            on_tools_change: None,
            on_connection_change: None,
            logger: Arc::new(NoOpLogger::new()),
        }
    }

    /// Tools announced once, when the first agent appears
    pub fn with_initial_tools(mut self, tools: impl IntoIterator<Item = ToolDefinition>) -> Self {
        self.initial_tools = tools.into_iter().collect();
        self
    }

    pub fn with_config(mut self, config: &SessionConfig) -> Self {
        self.response_timeout = config.rpc_timeout();
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn on_tools_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[ToolDefinition]) + Send + Sync + 'static,
    {
        self.on_tools_change = Some(Box::new(callback));
        self
    }

    pub fn on_connection_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(bool, Option<&str>) + Send + Sync + 'static,
    {
        self.on_connection_change = Some(Box::new(callback));
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> AssistantSession {
        let relay = ToolRelay::new(self.transport.clone(), self.logger.clone())
            .with_response_timeout(self.response_timeout);

        AssistantSession {
            transport: self.transport,
            relay,
            registry: RwLock::new(ToolRegistry::new()),
            status: RwLock::new(SessionStatus::default()),
            initial_tools: Mutex::new(self.initial_tools),
            on_tools_change: self.on_tools_change,
            on_connection_change: self.on_connection_change,
            gate: tokio::sync::Mutex::new(()),
            logger: self.logger,
        }
    }
}

/// Keeps the tools a voice agent may call in step with the host application.
///
/// The session follows the room through [`RoomEvent`]s. When an agent
/// participant appears it binds and announces the initial tool set; when the
/// agent leaves or the room closes it unbinds everything. In between, the
/// host mutates the tool set with `add_tool`, `update_tool`, `remove_tool` and
/// `upsert_tools`. A mutation only lands in the local registry after the
/// agent acknowledged it; a failed round trip is rolled back.
///
/// Mutations and event handling are serialized, so a session can be shared
/// behind an `Arc` and driven from several tasks.
pub struct AssistantSession {
    transport: Arc<dyn RoomTransport>,
    relay: ToolRelay,
    registry: RwLock<ToolRegistry>,
    status: RwLock<SessionStatus>,
    initial_tools: Mutex<Vec<ToolDefinition>>,
    on_tools_change: Option<ToolsChangeCallback>,
    on_connection_change: Option<ConnectionChangeCallback>,
    gate: tokio::sync::Mutex<()>,
    logger: Arc<dyn Logger>,
}

impl AssistantSession {
    pub fn builder(transport: Arc<dyn RoomTransport>) -> SessionBuilder {
        SessionBuilder::new(transport)
    }

    /// True only while the room is fully connected
    pub fn is_connected(&self) -> bool {
        self.status.read().is_connected()
    }

    pub fn agent_identity(&self) -> Option<String> {
        self.status.read().agent_identity.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.read().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.status.read().phase()
    }

    /// Tools the agent currently knows about, in registration order
    pub fn tools(&self) -> Vec<ToolDefinition> {
        self.registry.read().tools().to_vec()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.read().names()
    }

    /// Re-arm the initial tool set for the next agent that appears
    pub fn set_initial_tools(&self, tools: impl IntoIterator<Item = ToolDefinition>) {
        *self.initial_tools.lock() = tools.into_iter().collect();
    }

    /// Register a new tool with the agent
    pub async fn add_tool(&self, tool: ToolDefinition) -> SessionResult<()> {
        let _gate = self.gate.lock().await;
        let agent = self.require_agent()?;
        self.registry.read().ensure_absent(&tool.name)?;

        self.logger.info(&format!("[Session] Adding tool {}", tool.name));
        let mutation = RegistryMutation::add([&tool]);
        self.saga(&agent)
            .bind(tool.clone())
            .announce(mutation)
            .run()
            .await?;

        self.commit(|registry| registry.add(tool))
    }

    /// Replace an existing tool's definition and handler
    pub async fn update_tool(&self, tool: ToolDefinition) -> SessionResult<()> {
        let _gate = self.gate.lock().await;
        let agent = self.require_agent()?;
        let old = self.registered(&tool.name)?;

        self.logger.info(&format!("[Session] Updating tool {}", tool.name));
        let mutation = RegistryMutation::replace([&tool]);
        self.saga(&agent)
            .unbind(old)
            .bind(tool.clone())
            .announce(mutation)
            .run()
            .await?;

        self.commit(|registry| registry.update(tool))
    }

    /// Withdraw a tool from the agent
    pub async fn remove_tool(&self, name: &str) -> SessionResult<()> {
        let _gate = self.gate.lock().await;
        let agent = self.require_agent()?;
        let old = self.registered(name)?;

        self.logger.info(&format!("[Session] Removing tool {}", name));
        let mutation = RegistryMutation::remove([&old]);
        self.saga(&agent).unbind(old).announce(mutation).run().await?;

        self.commit(|registry| registry.remove(name).map(|_| ()))
    }

    /// Replace the whole tool set. Names must be unique within `tools`.
    pub async fn upsert_tools(&self, tools: Vec<ToolDefinition>) -> SessionResult<()> {
        let _gate = self.gate.lock().await;
        let agent = self.require_agent()?;
        let next = ToolRegistry::from_tools(tools)?;
        let previous = self.tools();

        self.logger.info(&format!(
            "[Session] Replacing {} tool(s) with [{}]",
            previous.len(),
            next.names().join(", ")
        ));

        let mut saga = self.saga(&agent);
        for old in previous {
            saga = saga.unbind(old);
        }
        for tool in next.tools() {
            saga = saga.bind(tool.clone());
        }
        saga.announce(RegistryMutation::replace(next.tools()))
            .run()
            .await?;

        self.commit(|registry| {
            *registry = next;
            Ok(())
        })
    }

    /// Replace the agent's system instructions
    pub async fn update_instruction(&self, instructions: &str) -> SessionResult<()> {
        let _gate = self.gate.lock().await;
        let agent = self.require_agent()?;
        self.relay.send_instructions(&agent, instructions).await?;
        Ok(())
    }

    /// Re-read connection state and participants from the transport.
    ///
    /// Useful when the session is created after the room already connected.
    pub async fn sync_with_room(&self) {
        let _gate = self.gate.lock().await;
        let before = self.status();
        self.status.write().connection = self.transport.connection_state();
        self.refresh_agent().await;
        self.notify_connection(&before);
    }

    /// Apply a single room event
    pub async fn handle_event(&self, event: RoomEvent) {
        let _gate = self.gate.lock().await;
        let before = self.status();

        match event {
            RoomEvent::ConnectionStateChanged(state) => {
                self.logger.debug(&format!("[Session] Connection state {:?}", state));
                self.status.write().connection = state;
            }
            RoomEvent::ParticipantConnected(participant) => {
                self.logger.debug(&format!(
                    "[Session] Participant joined: {} ({:?})",
                    participant.identity, participant.kind
                ));
            }
            RoomEvent::ParticipantDisconnected(participant) => {
                self.logger.debug(&format!("[Session] Participant left: {}", participant.identity));
            }
            RoomEvent::Disconnected => {
                self.logger.info("[Session] Room disconnected");
                self.status.write().connection = ConnectionState::Disconnected;
            }
        }

        self.refresh_agent().await;
        self.notify_connection(&before);
    }

    /// Drive the session from a room event stream.
    ///
    /// Returns once the room disconnects or the stream closes.
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<RoomEvent>) {
        self.sync_with_room().await;

        while let Some(event) = events.recv().await {
            let closed = matches!(event, RoomEvent::Disconnected);
            self.handle_event(event).await;
            if closed {
                break;
            }
        }
        self.logger.debug("[Session] Event loop finished");
    }

    fn require_agent(&self) -> SessionResult<String> {
        let status = self.status.read();
        match (&status.agent_identity, status.phase()) {
            (Some(agent), SessionPhase::ConnectedWithAgent) => Ok(agent.clone()),
            _ => Err(SessionError::NoAgent),
        }
    }

    fn registered(&self, name: &str) -> SessionResult<ToolDefinition> {
        self.registry
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| SessionError::UnknownTool(name.to_string()))
    }

    fn saga<'a>(&'a self, agent: &'a str) -> Saga<'a> {
        Saga::new(&self.relay, agent, self.logger.as_ref())
    }

    /// Apply an acknowledged change to the registry and notify the host
    fn commit<F>(&self, apply: F) -> SessionResult<()>
    where
        F: FnOnce(&mut ToolRegistry) -> RegistryResult<()>,
    {
        let tools = {
            let mut registry = self.registry.write();
            apply(&mut registry)?;
            registry.tools().to_vec()
        };
        self.notify_tools(&tools);
        Ok(())
    }

    /// Pick the agent from the current participants and react if it changed
    async fn refresh_agent(&self) {
        let (previous, connection) = {
            let status = self.status.read();
            (status.agent_identity.clone(), status.connection)
        };

        // An agent is only adopted once the room is connected. While
        // reconnecting the current one is kept if it is still listed.
        let next = match connection {
            ConnectionState::Connected => {
                select_agent(&self.transport.remote_participants(), previous.as_deref())
            }
            ConnectionState::Reconnecting => {
                select_agent(&self.transport.remote_participants(), previous.as_deref())
                    .filter(|agent| previous.as_deref() == Some(agent.as_str()))
            }
            _ => None,
        };

        if previous == next {
            return;
        }

        if let Some(previous) = &previous {
            self.logger.info(&format!("[Session] Agent {} is gone", previous));
            self.teardown().await;
        }

        self.status.write().agent_identity = next.clone();

        if let Some(agent) = &next {
            self.logger.info(&format!("[Session] Agent {} is present", agent));
            self.initial_sync(agent).await;
        }
    }

    /// Bind and announce the initial tool set. Consumed on first use.
    async fn initial_sync(&self, agent: &str) {
        let initial = std::mem::take(&mut *self.initial_tools.lock());
        if initial.is_empty() {
            return;
        }

        let mut bound = Vec::with_capacity(initial.len());
        for tool in initial {
            match self.relay.bind_handler(&tool).await {
                Ok(()) => bound.push(tool),
                Err(e) => self.logger.warn(&format!("[Session] Initial sync: {}", e)),
            }
        }

        if let Err(e) = self.relay.announce(agent, &RegistryMutation::replace(&bound)).await {
            self.logger.warn(&format!("[Session] Initial tool announcement failed: {}", e));
        }

        if let Err(e) = self.commit(|registry| registry.replace_all(bound)) {
            self.logger.error(&format!("[Session] Initial sync: {}", e));
        }
    }

    /// Unbind every handler and clear the registry.
    ///
    /// A tool whose handler could not be unbound stays listed, since the
    /// agent can still reach it.
    async fn teardown(&self) {
        let mut still_bound = Vec::new();
        for tool in self.tools() {
            if let Err(e) = self.relay.unbind_handler(&tool.name).await {
                self.logger.warn(&format!(
                    "[Session] Teardown: {}; {} stays registered",
                    e, tool.name
                ));
                still_bound.push(tool);
            }
        }

        if let Err(e) = self.commit(|registry| registry.replace_all(still_bound)) {
            self.logger.error(&format!("[Session] Teardown: {}", e));
        }
    }

    fn notify_tools(&self, tools: &[ToolDefinition]) {
        if let Some(callback) = &self.on_tools_change {
            callback(tools);
        }
    }

    fn notify_connection(&self, before: &SessionStatus) {
        let after = self.status();
        if before.is_connected() == after.is_connected() && before.agent_identity == after.agent_identity {
            return;
        }
        if let Some(callback) = &self.on_connection_change {
            callback(after.is_connected(), after.agent_identity.as_deref());
        }
    }
}

impl std::fmt::Debug for AssistantSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantSession")
            .field("status", &*self.status.read())
            .field("tools", &self.tool_names())
            .field("relay", &self.relay)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{LoopbackRoom, ParticipantInfo, TransportError};
    use crate::types::{MutationAction, ParameterConfig, ToolResponse};

    fn weather_tool() -> ToolDefinition {
        ToolDefinition::from_fn("get_weather", "Get the weather for a city", |inv| async move {
            let args: serde_json::Value = inv.arguments()?;
            let city = args["city"].as_str().unwrap_or("somewhere");
            ToolResponse::success(serde_json::json!({ "city": city, "temperature": 21 })).to_json()
        })
        .with_parameter("city", ParameterConfig::string("City name"), true)
    }

    fn joke_tool() -> ToolDefinition {
        ToolDefinition::from_fn("random_joke_maker", "Tell a joke", |_inv| async {
            Ok(r#"{"result":"knock knock"}"#.to_string())
        })
    }

    fn named(name: &str, reply: &'static str) -> ToolDefinition {
        ToolDefinition::from_fn(name, "test", move |_inv| async move { Ok(reply.to_string()) })
    }

    struct Harness {
        room: Arc<LoopbackRoom>,
        session: AssistantSession,
        events: mpsc::UnboundedReceiver<RoomEvent>,
        tool_changes: Arc<Mutex<Vec<Vec<String>>>>,
        connection_changes: Arc<Mutex<Vec<(bool, Option<String>)>>>,
    }

    impl Harness {
        fn new(initial: Vec<ToolDefinition>) -> Self {
            let room = Arc::new(LoopbackRoom::new("user"));
            let events = room.subscribe();
            let tool_changes = Arc::new(Mutex::new(Vec::new()));
            let connection_changes = Arc::new(Mutex::new(Vec::new()));

            let tc = tool_changes.clone();
            let cc = connection_changes.clone();
            let session = AssistantSession::builder(room.clone())
                .with_initial_tools(initial)
                .on_tools_change(move |tools| {
                    tc.lock().push(tools.iter().map(|t| t.name.clone()).collect());
                })
                .on_connection_change(move |connected, agent| {
                    cc.lock().push((connected, agent.map(str::to_string)));
                })
                .build();

            Self {
                room,
                session,
                events,
                tool_changes,
                connection_changes,
            }
        }

        async fn pump(&mut self) {
            while let Ok(event) = self.events.try_recv() {
                self.session.handle_event(event).await;
            }
        }

        async fn connect_with_agent(&mut self) {
            self.room.connect();
            self.room.join_agent("agent");
            self.pump().await;
        }
    }

    #[tokio::test]
    async fn test_initial_sync_announces_initial_tools() {
        let mut h = Harness::new(vec![weather_tool()]);
        h.connect_with_agent().await;

        assert!(h.session.is_connected());
        assert_eq!(h.session.agent_identity().as_deref(), Some("agent"));
        assert_eq!(h.session.phase(), SessionPhase::ConnectedWithAgent);

        let updates = h.room.tool_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].action, MutationAction::Replace);
        assert_eq!(updates[0].tool_names(), vec!["get_weather"]);
        assert_eq!(updates[0].tools[0].parameters.required, vec!["city"]);

        assert!(h.room.is_registered("get_weather"));
        assert_eq!(h.session.tool_names(), vec!["get_weather"]);
        assert_eq!(h.tool_changes.lock().last().cloned(), Some(vec!["get_weather".to_string()]));
        assert_eq!(
            h.connection_changes.lock().last().cloned(),
            Some((true, Some("agent".to_string())))
        );
    }

    #[tokio::test]
    async fn test_agent_can_invoke_bound_tool() {
        let mut h = Harness::new(vec![weather_tool()]);
        h.connect_with_agent().await;

        let reply = h
            .room
            .invoke_local("get_weather", r#"{"arguments":{"raw_arguments":{"city":"Lahore"}}}"#)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["result"]["city"], "Lahore");
    }

    #[tokio::test]
    async fn test_add_tool() {
        let mut h = Harness::new(vec![weather_tool()]);
        h.connect_with_agent().await;

        h.session.add_tool(joke_tool()).await.unwrap();

        assert!(h.room.is_registered("random_joke_maker"));
        let updates = h.room.tool_updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].action, MutationAction::Add);
        assert_eq!(updates[1].tool_names(), vec!["random_joke_maker"]);
        assert_eq!(h.session.tool_names(), vec!["get_weather", "random_joke_maker"]);
        assert_eq!(
            h.tool_changes.lock().last().cloned(),
            Some(vec!["get_weather".to_string(), "random_joke_maker".to_string()])
        );
    }

    #[tokio::test]
    async fn test_rejected_add_is_rolled_back() {
        let mut h = Harness::new(vec![weather_tool()]);
        h.connect_with_agent().await;
        let changes_before = h.tool_changes.lock().len();
        h.room.fail_next_rpc("agent refused");

        let err = h.session.add_tool(joke_tool()).await.unwrap_err();

        assert!(matches!(err, SessionError::Relay(_)));
        assert_eq!(h.session.tool_names(), vec!["get_weather"]);
        assert!(!h.room.is_registered("random_joke_maker"));
        assert!(h.room.is_registered("get_weather"));
        assert_eq!(h.tool_changes.lock().len(), changes_before);
    }

    #[tokio::test]
    async fn test_duplicate_add_has_no_side_effects() {
        let mut h = Harness::new(vec![named("get_weather", "sunny")]);
        h.connect_with_agent().await;
        h.room.clear_calls();
        let changes_before = h.tool_changes.lock().len();

        let err = h.session.add_tool(named("get_weather", "stormy")).await.unwrap_err();
        assert!(matches!(err, SessionError::DuplicateTool(ref name) if name == "get_weather"));

        assert!(h.room.calls().is_empty());
        assert_eq!(h.session.tool_names(), vec!["get_weather"]);
        assert_eq!(h.room.registered_methods(), vec!["get_weather"]);
        assert_eq!(h.room.invoke_local("get_weather", "{}").await.unwrap(), "sunny");
        assert_eq!(h.tool_changes.lock().len(), changes_before);
    }

    #[tokio::test]
    async fn test_unknown_tool_has_no_side_effects() {
        let mut h = Harness::new(vec![]);
        h.connect_with_agent().await;

        let err = h.session.remove_tool("missing").await.unwrap_err();
        assert!(matches!(err, SessionError::UnknownTool(ref name) if name == "missing"));

        let err = h.session.update_tool(named("missing", "x")).await.unwrap_err();
        assert!(matches!(err, SessionError::UnknownTool(_)));

        assert!(h.room.calls().is_empty());
        assert!(h.room.registered_methods().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_without_agent_fail() {
        let mut h = Harness::new(vec![]);

        // Disconnected
        assert!(matches!(h.session.add_tool(joke_tool()).await, Err(SessionError::NoAgent)));

        // Connected, only a regular participant
        h.room.connect();
        h.room.join(ParticipantInfo::standard("viewer"));
        h.pump().await;
        assert_eq!(h.session.phase(), SessionPhase::ConnectedNoAgent);

        assert!(matches!(h.session.add_tool(joke_tool()).await, Err(SessionError::NoAgent)));
        assert!(matches!(h.session.update_tool(joke_tool()).await, Err(SessionError::NoAgent)));
        assert!(matches!(h.session.remove_tool("get_weather").await, Err(SessionError::NoAgent)));
        assert!(matches!(h.session.upsert_tools(vec![joke_tool()]).await, Err(SessionError::NoAgent)));
        assert!(matches!(h.session.update_instruction("hi").await, Err(SessionError::NoAgent)));

        assert!(h.room.calls().is_empty());
        assert!(h.room.registered_methods().is_empty());
    }

    #[tokio::test]
    async fn test_update_tool_swaps_handler() {
        let mut h = Harness::new(vec![named("greet", "old")]);
        h.connect_with_agent().await;

        h.session.update_tool(named("greet", "new")).await.unwrap();

        assert_eq!(h.room.invoke_local("greet", "{}").await.unwrap(), "new");
        let last = h.room.tool_updates().pop().unwrap();
        assert_eq!(last.action, MutationAction::Replace);
        assert_eq!(last.tool_names(), vec!["greet"]);
    }

    #[tokio::test]
    async fn test_rejected_update_keeps_old_handler() {
        let mut h = Harness::new(vec![named("greet", "old")]);
        h.connect_with_agent().await;
        h.room.fail_next_rpc("no");

        h.session.update_tool(named("greet", "new")).await.unwrap_err();

        assert_eq!(h.room.invoke_local("greet", "{}").await.unwrap(), "old");
        assert_eq!(h.session.tool_names(), vec!["greet"]);
    }

    #[tokio::test]
    async fn test_remove_tool() {
        let mut h = Harness::new(vec![weather_tool(), joke_tool()]);
        h.connect_with_agent().await;

        h.session.remove_tool("get_weather").await.unwrap();

        assert!(!h.room.is_registered("get_weather"));
        assert_eq!(h.session.tool_names(), vec!["random_joke_maker"]);
        let last = h.room.tool_updates().pop().unwrap();
        assert_eq!(last.action, MutationAction::Remove);
        assert_eq!(last.tool_names(), vec!["get_weather"]);
    }

    #[tokio::test]
    async fn test_rejected_remove_rebinds() {
        let mut h = Harness::new(vec![weather_tool()]);
        h.connect_with_agent().await;
        h.room.fail_next_rpc("no");

        h.session.remove_tool("get_weather").await.unwrap_err();

        assert!(h.room.is_registered("get_weather"));
        assert_eq!(h.session.tool_names(), vec!["get_weather"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_everything() {
        let mut h = Harness::new(vec![]);
        h.connect_with_agent().await;

        h.session.upsert_tools(vec![named("a", "a"), named("b", "b")]).await.unwrap();
        h.session.upsert_tools(vec![named("b", "b2"), named("c", "c")]).await.unwrap();

        assert_eq!(h.session.tool_names(), vec!["b", "c"]);
        assert_eq!(h.room.registered_methods(), vec!["b", "c"]);
        assert_eq!(h.room.invoke_local("b", "{}").await.unwrap(), "b2");

        let last = h.room.tool_updates().pop().unwrap();
        assert_eq!(last.action, MutationAction::Replace);
        assert_eq!(last.tool_names(), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_upsert_rejects_duplicate_names() {
        let mut h = Harness::new(vec![]);
        h.connect_with_agent().await;

        let err = h
            .session
            .upsert_tools(vec![named("a", "1"), named("a", "2")])
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::DuplicateTool(_)));
        assert!(h.room.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_upsert_restores_previous_set() {
        let mut h = Harness::new(vec![named("a", "a")]);
        h.connect_with_agent().await;
        h.room.fail_next_rpc("no");

        h.session.upsert_tools(vec![named("b", "b")]).await.unwrap_err();

        assert_eq!(h.room.registered_methods(), vec!["a"]);
        assert_eq!(h.session.tool_names(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_update_instruction() {
        let mut h = Harness::new(vec![]);
        h.connect_with_agent().await;

        h.session.update_instruction("Speak like a pirate").await.unwrap();

        let calls = h.room.calls_to("update_instructions");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].destination_identity, "agent");
        assert_eq!(calls[0].payload, r#"{"instructions":"Speak like a pirate"}"#);
    }

    #[tokio::test]
    async fn test_agent_leave_and_rejoin() {
        let mut h = Harness::new(vec![weather_tool()]);
        h.connect_with_agent().await;

        h.room.leave("agent");
        h.pump().await;

        assert_eq!(h.session.phase(), SessionPhase::ConnectedNoAgent);
        assert!(h.session.tools().is_empty());
        assert!(h.room.registered_methods().is_empty());
        assert_eq!(h.tool_changes.lock().last().cloned(), Some(vec![]));
        assert_eq!(h.connection_changes.lock().last().cloned(), Some((true, None)));

        h.room.clear_calls();
        h.room.join_agent("agent");
        h.pump().await;

        assert_eq!(h.session.agent_identity().as_deref(), Some("agent"));
        assert!(h.room.calls().is_empty());
        assert!(h.session.tools().is_empty());
    }

    #[tokio::test]
    async fn test_rearmed_initial_tools_sync_on_next_agent() {
        let mut h = Harness::new(vec![]);
        h.connect_with_agent().await;
        assert!(h.room.tool_updates().is_empty());

        h.session.set_initial_tools([joke_tool()]);
        h.room.leave("agent");
        h.room.join_agent("agent-2");
        h.pump().await;

        assert_eq!(h.session.agent_identity().as_deref(), Some("agent-2"));
        let updates = h.room.tool_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].tool_names(), vec!["random_joke_maker"]);
        assert_eq!(h.room.calls()[0].destination_identity, "agent-2");
    }

    #[tokio::test]
    async fn test_failed_initial_announce_is_not_fatal() {
        let mut h = Harness::new(vec![weather_tool()]);
        h.room.fail_next_rpc("not ready");
        h.connect_with_agent().await;

        assert_eq!(h.session.phase(), SessionPhase::ConnectedWithAgent);
        assert_eq!(h.session.tool_names(), vec!["get_weather"]);
        assert!(h.room.is_registered("get_weather"));
    }

    #[tokio::test]
    async fn test_first_agent_is_kept() {
        let mut h = Harness::new(vec![]);
        h.room.connect();
        h.room.join_agent("agent-a");
        h.room.join_agent("agent-b");
        h.pump().await;
        assert_eq!(h.session.agent_identity().as_deref(), Some("agent-a"));

        h.room.leave("agent-a");
        h.pump().await;
        assert_eq!(h.session.agent_identity().as_deref(), Some("agent-b"));
    }

    #[tokio::test]
    async fn test_reconnecting_keeps_agent() {
        let mut h = Harness::new(vec![weather_tool()]);
        h.connect_with_agent().await;

        h.room.interrupt();
        h.pump().await;

        assert!(!h.session.is_connected());
        assert_eq!(h.session.agent_identity().as_deref(), Some("agent"));
        assert_eq!(h.connection_changes.lock().last().cloned(), Some((false, Some("agent".to_string()))));

        let err = h.session.add_tool(joke_tool()).await.unwrap_err();
        let SessionError::Relay(relay) = err else {
            panic!("expected relay error");
        };
        assert!(matches!(relay.transport_error(), Some(TransportError::NotConnected)));
        assert!(!h.room.is_registered("random_joke_maker"));

        h.room.connect();
        h.pump().await;
        assert!(h.session.is_connected());
        h.session.add_tool(joke_tool()).await.unwrap();
    }

    #[tokio::test]
    async fn test_agent_waits_for_room_to_connect() {
        let mut h = Harness::new(vec![weather_tool()]);
        h.room.begin_connect();
        h.room.join_agent("agent");
        h.pump().await;

        assert_eq!(h.session.phase(), SessionPhase::Disconnected);
        assert!(h.session.agent_identity().is_none());
        assert!(matches!(h.session.add_tool(joke_tool()).await, Err(SessionError::NoAgent)));
        assert!(h.room.calls().is_empty());
        assert!(h.room.registered_methods().is_empty());
        assert!(h.session.tools().is_empty());

        h.room.connect();
        h.pump().await;

        assert_eq!(h.session.phase(), SessionPhase::ConnectedWithAgent);
        let updates = h.room.tool_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].action, MutationAction::Replace);
        assert_eq!(updates[0].tool_names(), vec!["get_weather"]);
        assert!(h.room.is_registered("get_weather"));
        assert_eq!(h.session.tool_names(), vec!["get_weather"]);
    }

    #[tokio::test]
    async fn test_sync_while_connecting_defers_initial_tools() {
        let room = Arc::new(LoopbackRoom::new("user"));
        room.begin_connect();
        room.join_agent("agent");
        let mut events = room.subscribe();

        let session = AssistantSession::builder(room.clone())
            .with_initial_tools([weather_tool()])
            .build();
        session.sync_with_room().await;
        assert!(session.agent_identity().is_none());
        assert!(room.calls().is_empty());

        room.connect();
        while let Ok(event) = events.try_recv() {
            session.handle_event(event).await;
        }
        assert_eq!(room.tool_updates().len(), 1);
        assert_eq!(session.tool_names(), vec!["get_weather"]);
    }

    #[tokio::test]
    async fn test_new_agent_is_not_adopted_while_reconnecting() {
        let mut h = Harness::new(vec![]);
        h.connect_with_agent().await;

        h.room.interrupt();
        h.room.leave("agent");
        h.room.join_agent("agent-2");
        h.pump().await;
        assert!(h.session.agent_identity().is_none());

        h.room.connect();
        h.pump().await;
        assert_eq!(h.session.agent_identity().as_deref(), Some("agent-2"));
    }

    #[tokio::test]
    async fn test_teardown_keeps_tool_whose_unbind_failed() {
        let mut h = Harness::new(vec![named("a", "a"), named("b", "b")]);
        h.connect_with_agent().await;
        h.room.fail_next_unregister("a");

        h.room.leave("agent");
        h.pump().await;

        assert_eq!(h.session.phase(), SessionPhase::ConnectedNoAgent);
        assert_eq!(h.room.registered_methods(), vec!["a"]);
        assert_eq!(h.session.tool_names(), vec!["a"]);
        assert_eq!(h.tool_changes.lock().last().cloned(), Some(vec!["a".to_string()]));
    }

    #[tokio::test]
    async fn test_disconnect_clears_everything() {
        let mut h = Harness::new(vec![weather_tool()]);
        h.connect_with_agent().await;

        h.room.disconnect();
        h.pump().await;

        assert_eq!(h.session.phase(), SessionPhase::Disconnected);
        assert!(!h.session.is_connected());
        assert!(h.session.agent_identity().is_none());
        assert!(h.session.tools().is_empty());
        assert_eq!(h.connection_changes.lock().last().cloned(), Some((false, None)));
    }

    #[tokio::test]
    async fn test_run_until_disconnect() {
        let room = Arc::new(LoopbackRoom::new("user"));
        let events = room.subscribe();
        let session = Arc::new(
            AssistantSession::builder(room.clone())
                .with_initial_tools([weather_tool()])
                .build(),
        );

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.run(events).await }
        });

        room.connect();
        room.join_agent("agent");
        while session.agent_identity().is_none() {
            tokio::task::yield_now().await;
        }
        room.disconnect();
        task.await.unwrap();

        assert_eq!(room.tool_updates().len(), 1);
        assert!(session.tools().is_empty());
        assert_eq!(session.phase(), SessionPhase::Disconnected);
    }

    #[tokio::test]
    async fn test_run_until_stream_closes() {
        let room = Arc::new(LoopbackRoom::new("user"));
        let events = room.subscribe();
        let session = AssistantSession::builder(room.clone())
            .with_initial_tools([weather_tool()])
            .build();

        room.connect();
        room.join_agent("agent");
        // A new subscription drops the sender feeding `events`
        let _replacement = room.subscribe();

        session.run(events).await;

        assert_eq!(room.tool_updates().len(), 1);
        assert_eq!(session.tool_names(), vec!["get_weather"]);
    }

    #[tokio::test]
    async fn test_sync_with_already_connected_room() {
        let room = Arc::new(LoopbackRoom::new("user"));
        room.connect();
        room.join_agent("agent");

        let session = AssistantSession::builder(room.clone())
            .with_initial_tools([weather_tool()])
            .build();
        session.sync_with_room().await;

        assert_eq!(session.agent_identity().as_deref(), Some("agent"));
        assert!(room.is_registered("get_weather"));
    }

    #[tokio::test]
    async fn test_concurrent_mutations_are_serialized() {
        let mut h = Harness::new(vec![]);
        h.connect_with_agent().await;
        let session = Arc::new(h.session);

        let mut handles = Vec::new();
        for i in 0..8 {
            let session = session.clone();
            handles.push(tokio::spawn(async move {
                session.add_tool(named(&format!("tool_{}", i), "ok")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(session.tools().len(), 8);
        assert_eq!(h.room.registered_methods().len(), 8);
        assert_eq!(h.room.tool_updates().len(), 8);
    }
}

//! Session connection state and agent selection

use crate::transport::{ConnectionState, ParticipantInfo};

/// Coarse session phase that gates registry mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    ConnectedNoAgent,
    ConnectedWithAgent,
}

/// Connection state plus the participant currently acting as the agent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub connection: ConnectionState,
    pub agent_identity: Option<String>,
}

impl SessionStatus {
    /// Only a fully connected room counts; `Reconnecting` does not
    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// While reconnecting the agent is kept, so the phase stays
    /// `ConnectedWithAgent` and calls fail at the transport instead.
    /// A room that has not finished connecting has no agent yet.
    pub fn phase(&self) -> SessionPhase {
        match (&self.agent_identity, self.connection) {
            (Some(_), ConnectionState::Connected | ConnectionState::Reconnecting) => {
                SessionPhase::ConnectedWithAgent
            }
            (_, ConnectionState::Connected) => SessionPhase::ConnectedNoAgent,
            _ => SessionPhase::Disconnected,
        }
    }
}

/// Pick the agent among remote participants.
///
/// The current agent is kept while it is still present. Otherwise the first
/// agent-flagged participant in join order wins.
pub fn select_agent(participants: &[ParticipantInfo], current: Option<&str>) -> Option<String> {
    let mut agents = participants.iter().filter(|p| p.is_agent());

    if let Some(current) = current {
        if agents.clone().any(|p| p.identity == current) {
            return Some(current.to_string());
        }
    }

    agents.next().map(|p| p.identity.clone())
}

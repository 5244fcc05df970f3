//! Multi-step registry changes with compensation
//!
//! A registry change touches two places that cannot be updated atomically:
//! the transport's local method table and the agent's tool list. Each change
//! runs as a short saga of bind/unbind/announce steps. When a step fails, the
//! steps already done are undone in reverse order (a bind is undone by an
//! unbind and vice versa; an announce has no undo and is always last).
//!
//! Rollback is best effort. A failed compensation is logged and the original
//! error is returned.

use crate::logging::Logger;
use crate::relay::{RelayResult, ToolRelay};
use crate::types::{RegistryMutation, ToolDefinition};

#[derive(Debug, Clone)]
pub(crate) enum SagaStep {
    Bind(ToolDefinition),
    Unbind(ToolDefinition),
    Announce(RegistryMutation),
}

impl SagaStep {
    fn compensation(&self) -> Option<SagaStep> {
        match self {
            SagaStep::Bind(tool) => Some(SagaStep::Unbind(tool.clone())),
            SagaStep::Unbind(tool) => Some(SagaStep::Bind(tool.clone())),
            SagaStep::Announce(_) => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            SagaStep::Bind(tool) => format!("bind {}", tool.name),
            SagaStep::Unbind(tool) => format!("unbind {}", tool.name),
            SagaStep::Announce(mutation) => format!("announce {:?}", mutation.action),
        }
    }
}

pub(crate) struct Saga<'a> {
    relay: &'a ToolRelay,
    agent_identity: &'a str,
    logger: &'a dyn Logger,
    steps: Vec<SagaStep>,
}

impl<'a> Saga<'a> {
    pub(crate) fn new(relay: &'a ToolRelay, agent_identity: &'a str, logger: &'a dyn Logger) -> Self {
        Self {
            relay,
            agent_identity,
            logger,
            steps: Vec::new(),
        }
    }

    pub(crate) fn bind(mut self, tool: ToolDefinition) -> Self {
        self.steps.push(SagaStep::Bind(tool));
        self
    }

    pub(crate) fn unbind(mut self, tool: ToolDefinition) -> Self {
        self.steps.push(SagaStep::Unbind(tool));
        self
    }

    pub(crate) fn announce(mut self, mutation: RegistryMutation) -> Self {
        self.steps.push(SagaStep::Announce(mutation));
        self
    }

    async fn execute(&self, step: &SagaStep) -> RelayResult<()> {
        match step {
            SagaStep::Bind(tool) => self.relay.bind_handler(tool).await,
            SagaStep::Unbind(tool) => self.relay.unbind_handler(&tool.name).await,
            SagaStep::Announce(mutation) => self.relay.announce(self.agent_identity, mutation).await,
        }
    }

    /// Run every step in order, compensating on the first failure
    pub(crate) async fn run(mut self) -> RelayResult<()> {
        let steps = std::mem::take(&mut self.steps);
        let mut compensations = Vec::with_capacity(steps.len());

        for step in steps {
            if let Err(err) = self.execute(&step).await {
                self.logger.warn(&format!(
                    "[Saga] {} failed: {}; rolling back {} step(s)",
                    step.describe(),
                    err,
                    compensations.len()
                ));
                self.compensate(compensations).await;
                return Err(err);
            }
            if let Some(compensation) = step.compensation() {
                compensations.push(compensation);
            }
        }

        Ok(())
    }

    async fn compensate(&self, compensations: Vec<SagaStep>) {
        for step in compensations.into_iter().rev() {
            if let Err(err) = self.execute(&step).await {
                self.logger.error(&format!(
                    "[Saga] Compensation {} failed: {}",
                    step.describe(),
                    err
                ));
            }
        }
    }
}

//! Agent Registry
//!
//! Thread-safe, ordered, in-memory collection of agent definitions. The
//! execution engine treats it as read-only and only performs id lookups.

use crate::agent::model::{default_agents, Agent};
use crate::error::FlowError;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Suffix appended to the name of a duplicated agent
pub const COPY_SUFFIX: &str = " (副本)";

/// Whether `AgentRegistry::save` inserted or replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

/// Thread-safe registry of agent definitions
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    /// Agents in display order
    agents: Arc<RwLock<Vec<Agent>>>,
}

impl AgentRegistry {
    /// Create a new empty agent registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the built-in agents
    pub fn with_defaults() -> Self {
        Self::from_agents(default_agents())
    }

    /// Registry holding the given agents in the given order
    pub fn from_agents(agents: Vec<Agent>) -> Self {
        Self {
            agents: Arc::new(RwLock::new(agents)),
        }
    }

    /// Snapshot of all agents in order
    pub fn list(&self) -> Vec<Agent> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get agent by ID
    pub fn get(&self, agent_id: &str) -> Option<Agent> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|agent| agent.id == agent_id)
            .cloned()
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.get(agent_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a new agent or replace the one with the same id in place
    pub fn save(&self, agent: Agent) -> Result<SaveOutcome, FlowError> {
        agent.validate()?;

        let mut agents = self.agents.write().unwrap_or_else(PoisonError::into_inner);
        match agents.iter_mut().find(|existing| existing.id == agent.id) {
            Some(existing) => {
                debug!(agent_id = %agent.id, "Updated agent");
                *existing = agent;
                Ok(SaveOutcome::Updated)
            }
            None => {
                info!(agent_id = %agent.id, name = %agent.name, "Registered new agent");
                agents.push(agent);
                Ok(SaveOutcome::Created)
            }
        }
    }

    /// Remove an agent. Steps that still reference it are left alone.
    pub fn delete(&self, agent_id: &str) -> Option<Agent> {
        let mut agents = self.agents.write().unwrap_or_else(PoisonError::into_inner);
        let position = agents.iter().position(|agent| agent.id == agent_id)?;
        let removed = agents.remove(position);
        info!(agent_id = %agent_id, "Deleted agent");
        Some(removed)
    }

    /// Append a copy of an agent under a fresh id
    pub fn duplicate(&self, agent_id: &str) -> Option<Agent> {
        let mut agents = self.agents.write().unwrap_or_else(PoisonError::into_inner);
        let source = agents.iter().find(|agent| agent.id == agent_id)?;

        let mut copy = source.clone();
        copy.id = Uuid::new_v4().to_string();
        copy.name = format!("{}{}", source.name, COPY_SUFFIX);
        agents.push(copy.clone());

        debug!(source = %agent_id, copy = %copy.id, "Duplicated agent");
        Some(copy)
    }

    /// Set or clear the pinned flag. Returns false if the agent is unknown.
    pub fn set_pinned(&self, agent_id: &str, pinned: bool) -> bool {
        let mut agents = self.agents.write().unwrap_or_else(PoisonError::into_inner);
        match agents.iter_mut().find(|agent| agent.id == agent_id) {
            Some(agent) => {
                agent.is_pinned = pinned;
                true
            }
            None => false,
        }
    }

    /// Replace the whole collection (backup import)
    pub fn replace_all(&self, agents: Vec<Agent>) {
        *self.agents.write().unwrap_or_else(PoisonError::into_inner) = agents;
    }
}

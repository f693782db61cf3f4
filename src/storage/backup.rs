//! Whole-workspace backup documents

use crate::agent::Agent;
use crate::config::Settings;
use crate::error::FlowError;
use crate::task::WorkflowTask;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Backup of agents, history and settings. Every section is optional on
/// import; only the sections present are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Backup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<Agent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<WorkflowTask>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl Backup {
    /// Full backup with every section present
    pub fn full(agents: Vec<Agent>, history: Vec<WorkflowTask>, settings: Settings) -> Self {
        Self {
            agents: Some(agents),
            history: Some(history),
            settings: Some(settings),
        }
    }

    pub fn to_pretty_json(&self) -> Result<String, FlowError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FlowError::internal(format!("failed to encode backup: {e}")))
    }

    /// Parse a backup document; any malformed input is rejected as a whole
    pub fn parse(raw: &str) -> Result<Self, FlowError> {
        serde_json::from_str(raw)
            .map_err(|e| FlowError::invalid_input(format!("backup file is malformed: {e}")))
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_none() && self.history.is_none() && self.settings.is_none()
    }
}

/// `agent_platform_backup_YYYY-MM-DD.json` for today's UTC date
pub fn default_backup_file_name() -> String {
    format!(
        "agent_platform_backup_{}.json",
        Utc::now().format("%Y-%m-%d")
    )
}

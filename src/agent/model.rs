//! Agent entity and its built-in defaults

use crate::error::FlowError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Valid range for `Agent::priority`
pub const PRIORITY_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Informational grouping of agents; has no effect on execution order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgentCategory {
    Analysis,
    Execution,
    Verification,
}

impl AgentCategory {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            AgentCategory::Analysis => "分析型",
            AgentCategory::Execution => "执行型",
            AgentCategory::Verification => "验证型",
        }
    }

    /// Parse from either the serde name or the display label
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "analysis" | "分析型" => Some(AgentCategory::Analysis),
            "execution" | "执行型" => Some(AgentCategory::Execution),
            "verification" | "验证型" => Some(AgentCategory::Verification),
            _ => None,
        }
    }
}

impl fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A reusable instruction profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: String,
    /// Directive text sent as the role framing of every generation call
    pub instruction: String,
    pub category: AgentCategory,
    /// 1 (highest) to 5; informational only
    pub priority: u8,
    /// Reserved for dependency-aware scheduling; never consulted by the engine
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub is_pinned: bool,
}

impl Agent {
    /// Create an agent with a fresh id
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        instruction: impl Into<String>,
        category: AgentCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            role: role.into(),
            instruction: instruction.into(),
            category,
            priority: 3,
            dependencies: Vec::new(),
            is_pinned: false,
        }
    }

    /// Builder method to set an explicit id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder method to set the priority
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Check the fields execution relies on
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.id.trim().is_empty() {
            return Err(FlowError::invalid_input("agent id must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(FlowError::invalid_input("agent name must not be empty"));
        }
        if self.role.trim().is_empty() {
            return Err(FlowError::invalid_input(format!(
                "agent '{}' must have a role",
                self.name
            )));
        }
        if self.instruction.trim().is_empty() {
            return Err(FlowError::invalid_input(format!(
                "agent '{}' must have an instruction",
                self.name
            )));
        }
        if !PRIORITY_RANGE.contains(&self.priority) {
            return Err(FlowError::invalid_input(format!(
                "agent '{}' priority {} is outside 1..=5",
                self.name, self.priority
            )));
        }
        Ok(())
    }
}

/// Agents seeded into an empty registry
pub fn default_agents() -> Vec<Agent> {
    vec![
        Agent {
            id: "agent-1".to_string(),
            name: "代码审计专家".to_string(),
            role: "安全分析师".to_string(),
            instruction: "你是一名资深代码审计专家。请分析用户提供的代码，识别潜在的安全漏洞和性能瓶颈。"
                .to_string(),
            category: AgentCategory::Analysis,
            priority: 1,
            dependencies: Vec::new(),
            is_pinned: false,
        },
        Agent {
            id: "agent-2".to_string(),
            name: "逻辑架构师".to_string(),
            role: "系统设计".to_string(),
            instruction: "你负责将需求转化为清晰的技术架构逻辑。请给出模块化设计的具体建议。"
                .to_string(),
            category: AgentCategory::Execution,
            priority: 2,
            dependencies: Vec::new(),
            is_pinned: false,
        },
        Agent {
            id: "agent-3".to_string(),
            name: "质量保障官".to_string(),
            role: "测试开发".to_string(),
            instruction: "你负责对前序输出进行验证。请评估生成内容的逻辑严密性并输出测试方案。"
                .to_string(),
            category: AgentCategory::Verification,
            priority: 3,
            dependencies: Vec::new(),
            is_pinned: false,
        },
    ]
}

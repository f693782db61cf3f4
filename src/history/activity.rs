//! Operational activity log
//!
//! A short audit trail of user-visible operations (agent edits, task starts
//! and stops, imports). Details are sanitized before they are stored.

use crate::error::sanitize_error_message;
use crate::history::bounded::BoundedLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default number of log entries kept
pub const DEFAULT_MAX_LOG_ENTRIES: usize = 100;

/// What happened
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    AgentCreated,
    AgentUpdated,
    AgentDeleted,
    AgentCopied,
    TaskStarted,
    TaskStopped,
    HistoryCleared,
    HistoryEntryDeleted,
    DataExported,
    DataImported,
    SettingsUpdated,
}

impl ActivityAction {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityAction::AgentCreated => "创建Agent",
            ActivityAction::AgentUpdated => "更新Agent",
            ActivityAction::AgentDeleted => "删除Agent",
            ActivityAction::AgentCopied => "复制Agent",
            ActivityAction::TaskStarted => "启动任务",
            ActivityAction::TaskStopped => "终止任务",
            ActivityAction::HistoryCleared => "清理数据",
            ActivityAction::HistoryEntryDeleted => "删除记录",
            ActivityAction::DataExported => "导出数据",
            ActivityAction::DataImported => "导入数据",
            ActivityAction::SettingsUpdated => "更新设置",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One activity log line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: ActivityAction,
    pub detail: String,
}

impl LogEntry {
    pub fn new(action: ActivityAction, detail: impl AsRef<str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            detail: sanitize_error_message(detail.as_ref()),
        }
    }
}

/// Bounded, newest-first activity log
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: BoundedLog<LogEntry>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOG_ENTRIES)
    }
}

impl ActivityLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: BoundedLog::new(max_entries),
        }
    }

    pub fn from_entries(entries: Vec<LogEntry>, max_entries: usize) -> Self {
        Self {
            entries: BoundedLog::from_vec(entries, max_entries),
        }
    }

    /// Append an entry and return a copy of it
    pub fn add(&mut self, action: ActivityAction, detail: impl AsRef<str>) -> LogEntry {
        let entry = LogEntry::new(action, detail);
        self.entries.push(entry.clone());
        entry
    }

    /// Newest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.to_vec()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

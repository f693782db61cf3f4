//! Finished-task history
//!
//! The executor hands every finished run to a `HistoryRecorder` exactly once.
//! `TaskHistory` keeps them newest-first and enforces the configured maximum
//! at write time.

use crate::history::bounded::BoundedLog;
use crate::task::WorkflowTask;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Sink for finished tasks
pub trait HistoryRecorder: Send + Sync {
    /// Prepend a finished task, evicting the oldest entries beyond capacity
    fn record(&self, task: WorkflowTask);
}

/// Default number of finished tasks kept
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// In-memory, bounded, newest-first task history
#[derive(Debug)]
pub struct TaskHistory {
    entries: Mutex<BoundedLog<WorkflowTask>>,
}

impl Default for TaskHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl TaskHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(BoundedLog::new(max_entries)),
        }
    }

    /// Adopt previously persisted history (newest first)
    pub fn from_tasks(tasks: Vec<WorkflowTask>, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(BoundedLog::from_vec(tasks, max_entries)),
        }
    }

    /// Newest-first snapshot
    pub fn list(&self) -> Vec<WorkflowTask> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec()
    }

    pub fn get(&self, task_id: &str) -> Option<WorkflowTask> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|task| task.id == task_id)
            .cloned()
    }

    /// Remove one entry; returns whether it existed
    pub fn remove(&self, task_id: &str) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|task| task.id != task_id);
        entries.len() != before
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Apply a new maximum immediately; returns the number of evicted tasks
    pub fn set_capacity(&self, max_entries: usize) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_capacity(max_entries)
    }

    pub fn capacity(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .capacity()
    }

    /// Replace all entries (backup import), truncating to capacity
    pub fn replace_all(&self, tasks: Vec<WorkflowTask>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let capacity = entries.capacity();
        *entries = BoundedLog::from_vec(tasks, capacity);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryRecorder for TaskHistory {
    fn record(&self, task: WorkflowTask) {
        let task_id = task.id.clone();
        let evicted = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);
        debug!(task_id = %task_id, evicted, "Recorded task in history");
    }
}

//! Bounded records of past activity
//!
//! Finished tasks and operational log entries are both kept newest-first in
//! fixed-capacity lists that drop the oldest entries on overflow.

pub mod activity;
pub mod bounded;
pub mod recorder;

pub use activity::{ActivityAction, ActivityLog, LogEntry};
pub use bounded::BoundedLog;
pub use recorder::{HistoryRecorder, TaskHistory};

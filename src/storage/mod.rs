//! Keyed JSON persistence
//!
//! State is kept as independent JSON documents under fixed keys, so a corrupt
//! or missing document only affects its own collection. `Store` is the
//! seam; `JsonFileStore` keeps one file per key and `MemoryStore` backs tests.

pub mod backup;
pub mod file;
pub mod memory;

pub use backup::{default_backup_file_name, Backup};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Agent definitions
pub const AGENTS_KEY: &str = "fa_agents";
/// Finished tasks, newest first
pub const HISTORY_KEY: &str = "fa_history";
/// User preferences
pub const SETTINGS_KEY: &str = "fa_settings";
/// Operational activity log, newest first
pub const LOGS_KEY: &str = "fa_logs";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to (de)serialize {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }

    pub fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.into(),
            source,
        }
    }
}

/// Key-value document store
pub trait Store: Send + Sync {
    /// Raw document for `key`, `None` when nothing was ever written
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode the document stored under `key`
pub fn load_json<T: DeserializeOwned>(
    store: &dyn Store,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.read(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::serialization(key, e)),
        None => Ok(None),
    }
}

/// Encode `value` and store it under `key`
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn Store,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|e| StorageError::serialization(key, e))?;
    store.write(key, &raw)
}

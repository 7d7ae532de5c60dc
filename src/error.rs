//! Error types for the persistence layer.
//!
//! Most read-side failures are handled internally by the storage service
//! (absent keys and corrupt values resolve to defaults); the variants here
//! cover the failures that are surfaced to callers: import format problems
//! and write failures.

use thiserror::Error;

/// Failures surfaced by the persistence adapter.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An imported backup document is structurally unusable.
    #[error("invalid backup format: {0}")]
    Format(String),

    /// A stored value could not be parsed as JSON.
    #[error("corrupt value for key `{key}`: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization of an in-memory value failed.
    #[error("failed to serialize value for key `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The backend refused a write (quota, permissions, disk).
    #[error("failed to write key `{key}`: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

//! Error types for the storage backend and cache operations

use thiserror::Error;

/// Errors from the key-value storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Storage operation failed
    #[error("Storage operation failed: {0}")]
    Operation(String),

    /// Backend not reachable
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by cache partition operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Storage failure, propagated as-is (no retries at this layer)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A stored record could not be decoded
    #[error("Malformed cache record at {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A merged span could not be serialized for storage
    #[error("Failed to encode cache record: {0}")]
    Encode(#[from] serde_json::Error),

    /// Request rejected before any merge/storage work
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// The owning partition actor has stopped
    #[error("Partition actor is not running")]
    PartitionClosed,
}

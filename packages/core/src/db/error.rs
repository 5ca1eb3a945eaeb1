//! Backing Store Error Types
//!
//! Store failures are surfaced to callers verbatim; nothing in this crate
//! retries or rewraps them.

use thiserror::Error;

/// Backing store operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Record lookup by ID failed
    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    /// Synchronization with durable storage failed
    #[error("Sync failed: {0}")]
    SyncFailed(String),

    /// Local storage failure (lock poisoning, corrupt record, ...)
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl StoreError {
    /// Create a record not found error
    pub fn record_not_found(id: impl Into<String>) -> Self {
        Self::RecordNotFound { id: id.into() }
    }

    /// Create a sync failed error
    pub fn sync_failed(msg: impl Into<String>) -> Self {
        Self::SyncFailed(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }
}

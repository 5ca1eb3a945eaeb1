//! BackingStore Trait - Persistence Collaborator
//!
//! This module defines the `BackingStore` trait that abstracts the external
//! persistence/sync engine. The document tree only needs keyed attribute bags,
//! a query fetch, and an explicit `sync`.
//!
//! # Design Decisions
//!
//! 1. **Local writes are synchronous**: `set`/`delete` update the store's local view
//!    and never suspend, so tree mutations run to completion without awaiting.
//! 2. **Durability is explicit**: `sync` is the only suspension point. Failures are
//!    returned unchanged and are never retried here.
//! 3. **Error Handling**: Uses `StoreError` so callers can match on store failures.
//!
//! # Examples
//!
//! ```rust
//! use outline_core::db::{BackingStore, MemoryStore, RecordQuery};
//! use outline_core::models::NodeType;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), outline_core::db::StoreError> {
//! let store = MemoryStore::new();
//! let record = store.set(None, &NodeType::Text, json!({ "content": "hi" }))?;
//! store.sync().await?;
//!
//! let texts = store.fetch(RecordQuery::new().with_type(NodeType::Text)).await?;
//! assert_eq!(texts[0].id, record.id);
//! # Ok(())
//! # }
//! ```

use crate::db::StoreError;
use crate::models::NodeType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A keyed attribute bag as held by the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: String,
    pub node_type: NodeType,
    pub properties: Value,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Query predicate for `BackingStore::fetch`
///
/// All set criteria must match (AND semantics).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    /// Restrict to one node type
    pub node_type: Option<NodeType>,

    /// Attribute equality constraints
    pub properties: Vec<(String, Value)>,
}

impl RecordQuery {
    /// Create a new empty query (matches everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a node type
    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    /// Require `properties[key] == value`
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.push((key.into(), value));
        self
    }

    pub fn matches(&self, record: &StoredRecord) -> bool {
        if let Some(node_type) = &self.node_type {
            if &record.node_type != node_type {
                return false;
            }
        }

        self.properties
            .iter()
            .all(|(key, value)| record.properties.get(key) == Some(value))
    }
}

/// Persistence/sync collaborator consumed by the document tree
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a store can be shared behind an
/// `Arc` between the tree and services.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Get a record by ID
    ///
    /// - `Ok(Some(record))` if it exists
    /// - `Ok(None)` if it doesn't (not an error)
    fn get(&self, id: &str) -> Result<Option<StoredRecord>, StoreError>;

    /// Create or update a record
    ///
    /// `id == None` allocates a fresh identifier. An existing record has
    /// `properties` shallow-merged into its attributes.
    fn set(
        &self,
        id: Option<&str>,
        node_type: &NodeType,
        properties: Value,
    ) -> Result<StoredRecord, StoreError>;

    /// Delete a record, returning whether it existed
    fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Fetch every record matching `query`; result order is unspecified
    async fn fetch(&self, query: RecordQuery) -> Result<Vec<StoredRecord>, StoreError>;

    /// Push local changes to durable storage
    async fn sync(&self) -> Result<(), StoreError>;
}

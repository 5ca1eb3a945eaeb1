//! Tree Events
//!
//! Notifications raised by document-tree mutations. Every mutation returns the
//! events it produced, in emission order, and also publishes them on the tree's
//! broadcast channel so observers (UI bindings, persistence) can subscribe
//! without coupling to the placement engine.
//!
//! # Event Flow
//!
//! 1. `DocumentTree` performs a structural change (insert, remove, relocate)
//! 2. Events are collected in order
//! 3. The collected list is returned to the caller and broadcast to subscribers

use serde::{Deserialize, Serialize};

/// Notification raised on a node by a structural change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TreeEvent {
    /// Raised on a node detached from its parent (temporarily or permanently)
    #[serde(rename = "removed", rename_all = "camelCase")]
    Removed { node_id: String },

    /// Raised on a parent that gained `child_id` at `index`
    #[serde(rename = "added-child", rename_all = "camelCase")]
    AddedChild {
        parent_id: String,
        child_id: String,
        index: usize,
    },

    /// Raised on a parent whose last child changed
    #[serde(rename = "last-child-changed", rename_all = "camelCase")]
    LastChildChanged { parent_id: String },
}

impl TreeEvent {
    /// Event name as observed by subscribers
    pub fn event_type(&self) -> &'static str {
        match self {
            TreeEvent::Removed { .. } => "removed",
            TreeEvent::AddedChild { .. } => "added-child",
            TreeEvent::LastChildChanged { .. } => "last-child-changed",
        }
    }

    /// Node the event is raised on
    pub fn target_id(&self) -> &str {
        match self {
            TreeEvent::Removed { node_id } => node_id,
            TreeEvent::AddedChild { parent_id, .. } => parent_id,
            TreeEvent::LastChildChanged { parent_id } => parent_id,
        }
    }
}

//! Error types for document-tree operations
//!
//! The placement primitives check *structural* validity (the node exists, `after`
//! really is a child of `parent`, the parent can hold children, a node is not
//! moved into itself) before touching anything. Whether a type or depth is
//! admissible at a position is the resolvers' job and is not re-checked here.

use crate::db::StoreError;
use crate::models::{NodeType, ValidationError};
use thiserror::Error;

/// Errors that can occur during tree operations
///
/// # Examples
///
/// ```rust
/// use outline_core::operations::TreeOperationError;
///
/// let err = TreeOperationError::invalid_position("'x' is not a child of 'doc'");
/// assert!(err.to_string().contains("Invalid position"));
/// ```
#[derive(Error, Debug)]
pub enum TreeOperationError {
    /// Referenced node does not exist in this tree
    #[error("Node '{node_id}' does not exist")]
    NodeNotFound { node_id: String },

    /// Position does not describe a slot in the current tree
    ///
    /// Typically `after` is not a child of `parent`.
    #[error("Invalid position: {reason}")]
    InvalidPosition { reason: String },

    /// Parent type declares no child collection
    #[error("Node '{node_id}' of type '{node_type}' cannot hold children")]
    NotAContainer { node_id: String, node_type: NodeType },

    /// Node is not a child of the given parent
    #[error("Node '{child_id}' is not a child of '{parent_id}'")]
    NotAChild { parent_id: String, child_id: String },

    /// Node would become its own ancestor
    #[error("Circular reference: node '{node_id}' cannot be placed under '{target_id}'")]
    CircularReference { node_id: String, target_id: String },

    /// The document root is never removed or relocated
    #[error("Document '{node_id}' cannot be detached")]
    DocumentImmutable { node_id: String },

    /// Invalid tree configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Validation error from the node model
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    /// Backing store failure, passed through unchanged
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

impl TreeOperationError {
    /// Create a NodeNotFound error
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Create an InvalidPosition error
    pub fn invalid_position(reason: impl Into<String>) -> Self {
        Self::InvalidPosition {
            reason: reason.into(),
        }
    }

    /// Create a NotAContainer error
    pub fn not_a_container(node_id: impl Into<String>, node_type: NodeType) -> Self {
        Self::NotAContainer {
            node_id: node_id.into(),
            node_type,
        }
    }

    /// Create a NotAChild error
    pub fn not_a_child(parent_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        Self::NotAChild {
            parent_id: parent_id.into(),
            child_id: child_id.into(),
        }
    }

    /// Create a CircularReference error
    pub fn circular_reference(node_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self::CircularReference {
            node_id: node_id.into(),
            target_id: target_id.into(),
        }
    }

    /// Create a DocumentImmutable error
    pub fn document_immutable(node_id: impl Into<String>) -> Self {
        Self::DocumentImmutable {
            node_id: node_id.into(),
        }
    }
}

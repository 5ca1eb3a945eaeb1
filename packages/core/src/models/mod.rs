//! Data Models
//!
//! This module contains the core data structures used throughout Outline:
//!
//! - `Node` / `NodeType` - Universal node model for every content kind
//! - `Position` - Insertion coordinate (parent, preceding sibling)
//! - `TypeSchema` / `TypeRegistry` - Expected child types per container type
//! - `Comment` - Annotation records attached to nodes

mod comment;
pub mod core_schemas;
mod node;
mod position;
pub mod schema;

pub use comment::Comment;
pub use core_schemas::{get_core_schemas, CHILDREN_COLLECTION};
pub use node::{Node, NodeType, ValidationError};
pub use position::Position;
pub use schema::{CollectionSchema, TypeRegistry, TypeSchema};

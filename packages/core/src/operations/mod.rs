//! Tree Operations
//!
//! This module contains the document-tree engine:
//!
//! - `DocumentTree` - node placement (insert, remove, relocate, create, update)
//! - Placement resolvers - admissible child types and move targets
//! - `TreeOperationError` - structural and store failures

mod document_tree;
pub mod error;
mod resolver;

pub use document_tree::{DocumentTree, OutlineNode};
pub use error::TreeOperationError;
pub use resolver::ChildTypeCandidate;

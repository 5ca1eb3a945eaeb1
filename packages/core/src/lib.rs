//! Outline Core - Document Tree Engine
//!
//! This crate manipulates hierarchical documents: an ordered tree of typed nodes
//! (sections, text, images, ...) rooted at a document, with nesting of sections
//! bounded by a configurable maximum depth.
//!
//! # Architecture
//!
//! - **Arena tree**: nodes live in an id-keyed map; parents hold ordered child ids
//! - **Store first**: every mutation writes the backing store before memory
//! - **Cascading sections**: inserting a section pulls the following non-section
//!   siblings into it
//! - **Resolvers**: admissible child types and move targets keep every section
//!   within the depth limit
//!
//! # Modules
//!
//! - [`models`] - Node, NodeType, Position, Comment and the type registry
//! - [`operations`] - `DocumentTree` placement engine and resolvers
//! - [`services`] - `CommentService`
//! - [`db`] - `BackingStore` trait, in-memory store and tree events
//! - [`config`] - `TreeConfig`

pub mod config;
pub mod db;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use config::TreeConfig;
pub use db::{BackingStore, MemoryStore, StoreError, TreeEvent};
pub use models::*;
pub use operations::{ChildTypeCandidate, DocumentTree, OutlineNode, TreeOperationError};
pub use services::CommentService;

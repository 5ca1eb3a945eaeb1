//! Services
//!
//! Store-backed operations that live outside the document tree:
//!
//! - `CommentService` - load, create and remove the comments attached to a node

pub mod comment_service;

pub use comment_service::CommentService;

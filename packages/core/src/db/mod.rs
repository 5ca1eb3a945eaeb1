//! Backing Store Layer
//!
//! This module models the external persistence/sync engine:
//!
//! - `BackingStore` trait - keyed attribute bags, query fetch, explicit sync
//! - `MemoryStore` - in-process implementation for tests and demos
//! - `TreeEvent` - notifications raised by tree mutations
//!
//! Durable formats and transport live outside this crate;
//! production stores implement `BackingStore` elsewhere.

mod error;
pub mod events;
mod memory_store;
mod node_store;

pub use error::StoreError;
pub use events::TreeEvent;
pub use memory_store::MemoryStore;
pub use node_store::{BackingStore, RecordQuery, StoredRecord};

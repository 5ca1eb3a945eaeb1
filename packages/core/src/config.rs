/// Configuration for the document tree
use crate::models::CHILDREN_COLLECTION;
use serde::{Deserialize, Serialize};

/// Deepest section nesting the resolvers will ever offer
const DEFAULT_MAX_SECTION_DEPTH: usize = 4;

/// Broadcast channel capacity for tree events
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Runtime settings for `DocumentTree`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Maximum section nesting depth (a section holding only leaves has depth 1)
    pub max_section_depth: usize,

    /// Child collection the tree operates on
    pub children_collection: String,

    /// Capacity of the event broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_section_depth: DEFAULT_MAX_SECTION_DEPTH,
            children_collection: CHILDREN_COLLECTION.to_string(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl TreeConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_section_depth == 0 {
            return Err("max_section_depth must be greater than 0".to_string());
        }

        if self.children_collection.is_empty() {
            return Err("children_collection cannot be empty".to_string());
        }

        if self.event_channel_capacity == 0 {
            return Err("event_channel_capacity must be greater than 0".to_string());
        }

        Ok(())
    }
}

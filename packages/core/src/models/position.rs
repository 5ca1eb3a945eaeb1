//! Insertion coordinates inside a document tree

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a node goes: as a child of `parent`, directly after `after`.
///
/// `after == None` means "no predecessor", i.e. the node becomes the first child.
/// When `after` is set it must currently be a child of `parent`; `DocumentTree`
/// rejects positions that break this with `InvalidPosition`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub parent: String,
    pub after: Option<String>,
}

impl Position {
    pub fn new(parent: impl Into<String>, after: Option<String>) -> Self {
        Self {
            parent: parent.into(),
            after,
        }
    }

    /// First slot of `parent`
    pub fn first(parent: impl Into<String>) -> Self {
        Self::new(parent, None)
    }

    /// Slot directly after `after` inside `parent`
    pub fn after(parent: impl Into<String>, after: impl Into<String>) -> Self {
        Self::new(parent, Some(after.into()))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.after {
            Some(after) => write!(f, "Position({}, {})", self.parent, after),
            None => write!(f, "Position({}, none)", self.parent),
        }
    }
}

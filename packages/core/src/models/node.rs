//! Node Data Structures
//!
//! This module defines the core `Node` struct and the `NodeType` enumeration for
//! Outline's document tree.
//!
//! # Architecture
//!
//! - **Universal Node**: Single struct represents every content kind (section, text, image, ...)
//! - **JSON Attributes**: Kind-specific data lives in the `properties` object
//! - **Id-keyed Arena**: Nodes reference parents, documents and children by identifier only,
//!   so the tree never holds reference cycles
//!
//! # Examples
//!
//! ```rust
//! use outline_core::models::{Node, NodeType};
//! use serde_json::json;
//!
//! let text = Node::new(NodeType::Text, Some("doc-1".to_string()), json!({ "content": "Hello" }));
//! assert_eq!(text.content(), Some("Hello"));
//! assert!(!text.is_section());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for Node operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid node type: {0}")]
    InvalidNodeType(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("Invalid document reference: {0}")]
    InvalidDocument(String),

    #[error("Properties validation failed: {0}")]
    InvalidProperties(String),
}

/// Content kind of a node.
///
/// Built-in kinds have fixed keys; anything else is carried as `Custom` so that
/// type schemas registered at runtime still round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Document,
    Section,
    Text,
    Image,
    Resource,
    Quote,
    Code,
    Comment,
    Custom(String),
}

/// Canonical presentation order for insertable child types.
const CANONICAL_ORDER: [NodeType; 6] = [
    NodeType::Section,
    NodeType::Text,
    NodeType::Image,
    NodeType::Resource,
    NodeType::Quote,
    NodeType::Code,
];

impl NodeType {
    /// Stable key of this type (e.g. `"section"`)
    pub fn key(&self) -> &str {
        match self {
            NodeType::Document => "document",
            NodeType::Section => "section",
            NodeType::Text => "text",
            NodeType::Image => "image",
            NodeType::Resource => "resource",
            NodeType::Quote => "quote",
            NodeType::Code => "code",
            NodeType::Comment => "comment",
            NodeType::Custom(key) => key,
        }
    }

    /// Parse a type key, falling back to `Custom` for unknown keys
    pub fn from_key(key: &str) -> Self {
        match key {
            "document" => NodeType::Document,
            "section" => NodeType::Section,
            "text" => NodeType::Text,
            "image" => NodeType::Image,
            "resource" => NodeType::Resource,
            "quote" => NodeType::Quote,
            "code" => NodeType::Code,
            "comment" => NodeType::Comment,
            other => NodeType::Custom(other.to_string()),
        }
    }

    pub fn is_section(&self) -> bool {
        matches!(self, NodeType::Section)
    }

    /// Position in the canonical child-type order; unknown types sort last.
    pub fn canonical_rank(&self) -> usize {
        CANONICAL_ORDER
            .iter()
            .position(|candidate| candidate == self)
            .unwrap_or(usize::MAX)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<String> for NodeType {
    fn from(key: String) -> Self {
        NodeType::from_key(&key)
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        node_type.key().to_string()
    }
}

/// Universal Node structure for all content in an Outline document.
///
/// # Fields
///
/// - `id`: Unique identifier (UUID v4)
/// - `node_type`: Content kind
/// - `document_id`: Owning document (None for the document itself)
/// - `parent_id`: Current parent (None for the document and for detached nodes)
/// - `children`: Ordered child identifiers; authoritative for structure and order
/// - `properties`: JSON object with kind-specific attributes (title, content, url, ...)
/// - `dirty`: Set when the ordered children changed since the last persist
///
/// Child order is only ever changed through `DocumentTree`, which keeps
/// `parent_id` and `children` consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier
    pub id: String,

    /// Content kind
    pub node_type: NodeType,

    /// Owning document reference
    pub document_id: Option<String>,

    /// Current parent reference
    pub parent_id: Option<String>,

    /// Ordered child identifiers
    #[serde(default)]
    pub(crate) children: Vec<String>,

    /// Kind-specific attributes
    pub properties: serde_json::Value,

    /// Pending persistence of the child order
    #[serde(skip)]
    pub dirty: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl Node {
    /// Create a new detached Node with an auto-generated UUID
    pub fn new(
        node_type: NodeType,
        document_id: Option<String>,
        properties: serde_json::Value,
    ) -> Self {
        Self::new_with_id(
            Uuid::new_v4().to_string(),
            node_type,
            document_id,
            properties,
        )
    }

    /// Create a new detached Node with an explicit identifier
    ///
    /// Used when the backing store hands out the identifier.
    pub fn new_with_id(
        id: String,
        node_type: NodeType,
        document_id: Option<String>,
        properties: serde_json::Value,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            node_type,
            document_id,
            parent_id: None,
            children: Vec::new(),
            properties,
            dirty: false,
            created_at: now,
            modified_at: now,
        }
    }

    /// Validate node structure and required fields
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `id` is empty
    /// - `properties` is not a JSON object
    /// - Node references itself as parent or document
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if self.node_type.key().is_empty() {
            return Err(ValidationError::InvalidNodeType(
                "node type key cannot be empty".to_string(),
            ));
        }

        if !self.properties.is_object() {
            return Err(ValidationError::InvalidProperties(
                "properties must be a JSON object".to_string(),
            ));
        }

        if self.parent_id.as_deref() == Some(self.id.as_str()) {
            return Err(ValidationError::InvalidParent(
                "Node cannot be its own parent".to_string(),
            ));
        }

        if self.document_id.as_deref() == Some(self.id.as_str()) {
            return Err(ValidationError::InvalidDocument(
                "Node cannot be its own document".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_section(&self) -> bool {
        self.node_type.is_section()
    }

    pub fn is_document(&self) -> bool {
        self.node_type == NodeType::Document
    }

    /// Ordered child identifiers
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Identifier of the last child, if any
    pub fn last_child(&self) -> Option<&str> {
        self.children.last().map(String::as_str)
    }

    /// Index of `child_id` among this node's children
    pub fn child_index(&self, child_id: &str) -> Option<usize> {
        self.children.iter().position(|id| id == child_id)
    }

    /// The document this node belongs to; a document owns itself.
    pub fn owning_document_id(&self) -> &str {
        self.document_id.as_deref().unwrap_or(&self.id)
    }

    fn string_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|value| value.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.string_property("title")
    }

    pub fn name(&self) -> Option<&str> {
        self.string_property("name")
    }

    pub fn content(&self) -> Option<&str> {
        self.string_property("content")
    }

    pub fn creator(&self) -> Option<&str> {
        self.string_property("creator")
    }

    /// Document modification time (alias of `modified_at`)
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Merge properties with existing properties (shallow merge)
    pub fn merge_properties(&mut self, updates: &serde_json::Value) {
        if let (Some(existing), Some(new)) = (self.properties.as_object_mut(), updates.as_object())
        {
            for (key, value) in new {
                existing.insert(key.clone(), value.clone());
            }
            self.modified_at = Utc::now();
        }
    }

    /// Attributes as written to the backing store, including structure.
    pub fn to_record_properties(&self) -> serde_json::Value {
        let mut properties = self.properties.clone();
        if let Some(object) = properties.as_object_mut() {
            object.insert(
                "children".to_string(),
                serde_json::Value::from(self.children.clone()),
            );
            if let Some(document_id) = &self.document_id {
                object.insert(
                    "document".to_string(),
                    serde_json::Value::String(document_id.clone()),
                );
            }
        }
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_creation() {
        let node = Node::new(NodeType::Text, Some("doc-1".to_string()), json!({}));
        assert_eq!(node.node_type, NodeType::Text);
        assert_eq!(node.document_id.as_deref(), Some("doc-1"));
        assert!(node.parent_id.is_none());
        assert!(node.children().is_empty());
        assert!(!node.dirty);
        assert!(Uuid::parse_str(&node.id).is_ok());
    }

    #[test]
    fn test_node_validation() {
        let node = Node::new(NodeType::Section, None, json!({}));
        assert!(node.validate().is_ok());

        let mut bad_props = node.clone();
        bad_props.properties = json!("not an object");
        assert!(matches!(
            bad_props.validate(),
            Err(ValidationError::InvalidProperties(_))
        ));

        let mut own_parent = node.clone();
        own_parent.parent_id = Some(own_parent.id.clone());
        assert!(matches!(
            own_parent.validate(),
            Err(ValidationError::InvalidParent(_))
        ));

        let mut own_document = node;
        own_document.document_id = Some(own_document.id.clone());
        assert!(matches!(
            own_document.validate(),
            Err(ValidationError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_node_type_keys() {
        assert_eq!(NodeType::from_key("section"), NodeType::Section);
        assert_eq!(NodeType::from_key("code"), NodeType::Code);
        assert_eq!(
            NodeType::from_key("table"),
            NodeType::Custom("table".to_string())
        );
        assert_eq!(NodeType::Custom("table".to_string()).key(), "table");
        assert_eq!(NodeType::Quote.to_string(), "quote");
    }

    #[test]
    fn test_canonical_rank() {
        assert_eq!(NodeType::Section.canonical_rank(), 0);
        assert_eq!(NodeType::Code.canonical_rank(), 5);
        assert_eq!(NodeType::Comment.canonical_rank(), usize::MAX);
        assert!(NodeType::Text.canonical_rank() < NodeType::Image.canonical_rank());
    }

    #[test]
    fn test_typed_accessors() {
        let node = Node::new(
            NodeType::Document,
            None,
            json!({ "title": "Report", "name": "report", "creator": "/user/ada" }),
        );
        assert_eq!(node.title(), Some("Report"));
        assert_eq!(node.name(), Some("report"));
        assert_eq!(node.creator(), Some("/user/ada"));
        assert_eq!(node.content(), None);
        assert_eq!(node.owning_document_id(), node.id);
    }

    #[test]
    fn test_node_properties_merge() {
        let mut node = Node::new(NodeType::Text, None, json!({ "content": "a", "lang": "en" }));
        let before = node.modified_at;
        node.merge_properties(&json!({ "content": "b" }));
        assert_eq!(node.content(), Some("b"));
        assert_eq!(node.properties["lang"], "en");
        assert!(node.modified_at >= before);
    }

    #[test]
    fn test_node_serialization() {
        let node = Node::new(NodeType::Image, Some("doc".to_string()), json!({ "url": "a.png" }));
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["nodeType"], "image");
        assert_eq!(value["documentId"], "doc");
        assert!(value.get("dirty").is_none());

        let back: Node = serde_json::from_value(value).unwrap();
        assert_eq!(back.node_type, NodeType::Image);
    }

    #[test]
    fn test_record_properties_include_structure() {
        let mut node = Node::new(NodeType::Section, Some("doc".to_string()), json!({}));
        node.children.push("child-1".to_string());
        let record = node.to_record_properties();
        assert_eq!(record["children"], json!(["child-1"]));
        assert_eq!(record["document"], "doc");
    }
}

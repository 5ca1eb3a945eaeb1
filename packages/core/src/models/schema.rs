//! Type Schema Types
//!
//! Every node type declares its named child collections and, for each, the
//! ordered list of types it accepts. The placement resolvers read these
//! declarations; the mutation primitives do not.
//!
//! ## Example Schema
//!
//! ```json
//! {
//!   "nodeType": "section",
//!   "name": "Section",
//!   "description": "Nestable heading with ordered content",
//!   "collections": [
//!     { "name": "children", "expectedTypes": ["section", "text", "image"] }
//!   ]
//! }
//! ```

use crate::models::core_schemas::get_core_schemas;
use crate::models::NodeType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named ordered child collection and the types it accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    /// Collection name (e.g. "children")
    pub name: String,

    /// Accepted child types, in declaration order
    pub expected_types: Vec<NodeType>,
}

/// Type-level metadata for one node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSchema {
    pub node_type: NodeType,

    /// Human-readable type name
    pub name: String,

    pub description: String,

    /// Child collections; empty for leaf types
    #[serde(default)]
    pub collections: Vec<CollectionSchema>,
}

impl TypeSchema {
    /// Schema with no child collections; add them with `with_collection`
    pub fn new(
        node_type: NodeType,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            node_type,
            name: name.into(),
            description: description.into(),
            collections: Vec::new(),
        }
    }

    /// Add a child collection (builder style)
    pub fn with_collection(mut self, name: impl Into<String>, expected_types: Vec<NodeType>) -> Self {
        self.collections.push(CollectionSchema {
            name: name.into(),
            expected_types,
        });
        self
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.iter().find(|collection| collection.name == name)
    }
}

/// Lookup table from node type to its schema
///
/// Defaults to the core schemas (document, section and the leaf content kinds).
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    schemas: HashMap<NodeType, TypeSchema>,
}

impl TypeRegistry {
    /// Registry without any schemas
    pub fn empty() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Registry seeded with the core schemas
    pub fn with_core_schemas() -> Self {
        let mut registry = Self::empty();
        for schema in get_core_schemas() {
            registry.register(schema);
        }
        registry
    }

    /// Register or replace a schema, returning the previous one
    pub fn register(&mut self, schema: TypeSchema) -> Option<TypeSchema> {
        self.schemas.insert(schema.node_type.clone(), schema)
    }

    pub fn schema(&self, node_type: &NodeType) -> Option<&TypeSchema> {
        self.schemas.get(node_type)
    }

    /// Display name of a type, falling back to its key when unregistered
    pub fn type_name(&self, node_type: &NodeType) -> String {
        self.schema(node_type)
            .map(|schema| schema.name.clone())
            .unwrap_or_else(|| node_type.key().to_string())
    }

    /// Types accepted by `collection` of `node_type`; empty when undeclared
    pub fn expected_types(&self, node_type: &NodeType, collection: &str) -> &[NodeType] {
        self.schema(node_type)
            .and_then(|schema| schema.collection(collection))
            .map(|collection| collection.expected_types.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `node_type` declares the named collection at all
    pub fn has_collection(&self, node_type: &NodeType, collection: &str) -> bool {
        self.schema(node_type)
            .and_then(|schema| schema.collection(collection))
            .is_some()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_core_schemas()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_registry_containers() {
        let registry = TypeRegistry::default();
        assert!(registry.has_collection(&NodeType::Document, "children"));
        assert!(registry.has_collection(&NodeType::Section, "children"));
        assert!(!registry.has_collection(&NodeType::Text, "children"));
        assert!(registry
            .expected_types(&NodeType::Section, "children")
            .contains(&NodeType::Section));
        assert!(registry.expected_types(&NodeType::Text, "children").is_empty());
    }

    #[test]
    fn test_type_name_fallback() {
        let registry = TypeRegistry::default();
        assert_eq!(registry.type_name(&NodeType::Section), "Section");
        assert_eq!(
            registry.type_name(&NodeType::Custom("table".to_string())),
            "table"
        );
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = TypeRegistry::default();
        let replaced = registry.register(
            TypeSchema::new(NodeType::Section, "Chapter", "Flat chapter")
                .with_collection("children", vec![NodeType::Text]),
        );
        assert!(replaced.is_some());
        assert_eq!(
            registry.expected_types(&NodeType::Section, "children"),
            &[NodeType::Text]
        );
    }

    #[test]
    fn test_schema_serialization() {
        let schema = TypeSchema::new(NodeType::Section, "Section", "")
            .with_collection("children", vec![NodeType::Text]);
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["nodeType"], "section");
        assert_eq!(value["collections"][0]["expectedTypes"][0], "text");
    }
}

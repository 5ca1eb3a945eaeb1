//! Core Schema Definitions
//!
//! Canonical definitions for the types that ship with Outline.
//!
//! ## Core Schemas
//!
//! - **document** - Tree root; holds sections and content
//! - **section** - Nestable container (max nesting depth 4)
//! - **text**, **image**, **resource**, **quote**, **code** - Leaf content
//! - **comment** - Annotation attached to a node; never placed in the tree

use crate::models::schema::TypeSchema;
use crate::models::NodeType;

/// Name of the only child collection used by the document tree
pub const CHILDREN_COLLECTION: &str = "children";

/// Types a document or section accepts as children
fn content_types() -> Vec<NodeType> {
    vec![
        NodeType::Section,
        NodeType::Text,
        NodeType::Image,
        NodeType::Resource,
        NodeType::Quote,
        NodeType::Code,
    ]
}

/// Get all core schema definitions
pub fn get_core_schemas() -> Vec<TypeSchema> {
    vec![
        TypeSchema::new(NodeType::Document, "Document", "Root of a document tree")
            .with_collection(CHILDREN_COLLECTION, content_types()),
        TypeSchema::new(
            NodeType::Section,
            "Section",
            "Nestable heading with ordered content",
        )
        .with_collection(CHILDREN_COLLECTION, content_types()),
        TypeSchema::new(NodeType::Text, "Text", "Paragraph of rich text"),
        TypeSchema::new(NodeType::Image, "Image", "Embedded image"),
        TypeSchema::new(NodeType::Resource, "Resource", "Link to an external resource"),
        TypeSchema::new(NodeType::Quote, "Quote", "Block quotation"),
        TypeSchema::new(NodeType::Code, "Code", "Source code block"),
        TypeSchema::new(NodeType::Comment, "Comment", "Annotation on a node"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_schema_count() {
        assert_eq!(get_core_schemas().len(), 8);
    }

    #[test]
    fn test_only_document_and_section_are_containers() {
        let containers: Vec<NodeType> = get_core_schemas()
            .into_iter()
            .filter(|schema| schema.collection(CHILDREN_COLLECTION).is_some())
            .map(|schema| schema.node_type)
            .collect();
        assert_eq!(containers, vec![NodeType::Document, NodeType::Section]);
    }
}

//! Comment model
//!
//! Comments are stored as backing-store records of type `comment` that point at
//! the node they annotate through the `node` attribute.

use crate::db::StoredRecord;
use crate::models::{NodeType, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,

    /// Annotated node
    pub node_id: String,

    /// Document of the annotated node
    pub document_id: Option<String>,

    pub creator: String,

    pub content: String,

    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Attributes written to the backing store for a new comment
    pub fn new_properties(
        node_id: &str,
        document_id: &str,
        creator: &str,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> serde_json::Value {
        json!({
            "node": node_id,
            "document": document_id,
            "creator": creator,
            "content": content,
            "created_at": created_at.to_rfc3339(),
        })
    }

    /// Decode a stored comment record.
    ///
    /// `created_at` comes from the record attributes when present, otherwise
    /// from the record timestamp.
    pub fn from_record(record: &StoredRecord) -> Result<Self, ValidationError> {
        if record.node_type != NodeType::Comment {
            return Err(ValidationError::InvalidNodeType(format!(
                "Expected 'comment', got '{}'",
                record.node_type
            )));
        }

        let text = |key: &str| record.properties.get(key).and_then(|value| value.as_str());

        let node_id = text("node")
            .ok_or_else(|| ValidationError::MissingField("node".to_string()))?
            .to_string();

        let created_at = match text("created_at") {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map_err(|e| {
                    ValidationError::InvalidProperties(format!("created_at '{}': {}", raw, e))
                })?
                .with_timezone(&Utc),
            None => record.created_at,
        };

        Ok(Self {
            id: record.id.clone(),
            node_id,
            document_id: text("document").map(str::to_string),
            creator: text("creator").unwrap_or_default().to_string(),
            content: text("content").unwrap_or_default().to_string(),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(properties: serde_json::Value) -> StoredRecord {
        let now = Utc::now();
        StoredRecord {
            id: "comment-1".to_string(),
            node_type: NodeType::Comment,
            properties,
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn test_from_record() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let rec = record(Comment::new_properties("n1", "d1", "/user/ada", "Nice", at));
        let comment = Comment::from_record(&rec).unwrap();
        assert_eq!(comment.node_id, "n1");
        assert_eq!(comment.document_id.as_deref(), Some("d1"));
        assert_eq!(comment.content, "Nice");
        assert_eq!(comment.created_at, at);
    }

    #[test]
    fn test_from_record_requires_node() {
        let rec = record(json!({ "content": "orphan" }));
        assert!(matches!(
            Comment::from_record(&rec),
            Err(ValidationError::MissingField(field)) if field == "node"
        ));
    }

    #[test]
    fn test_from_record_rejects_other_types() {
        let mut rec = record(json!({ "node": "n1" }));
        rec.node_type = NodeType::Text;
        assert!(Comment::from_record(&rec).is_err());
    }

    #[test]
    fn test_created_at_falls_back_to_record() {
        let rec = record(json!({ "node": "n1" }));
        let comment = Comment::from_record(&rec).unwrap();
        assert_eq!(comment.created_at, rec.created_at);
    }
}

//! Wire types for the Firestore REST `runQuery` endpoint.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Request
// =============================================================================

/// Body of a `documents:runQuery` call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest<'a> {
    pub structured_query: StructuredQuery<'a>,
}

impl<'a> RunQueryRequest<'a> {
    /// All documents of `collection`, newest first.
    #[must_use]
    pub fn newest_first(collection: &'a str) -> Self {
        Self {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: collection,
                }],
                order_by: vec![Order {
                    field: FieldReference {
                        field_path: "createdAt",
                    },
                    direction: Direction::Descending,
                }],
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery<'a> {
    pub from: Vec<CollectionSelector<'a>>,
    pub order_by: Vec<Order<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector<'a> {
    pub collection_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Order<'a> {
    pub field: FieldReference<'a>,
    pub direction: Direction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference<'a> {
    pub field_path: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Ascending,
    Descending,
}

// =============================================================================
// Response
// =============================================================================

/// One element of the streamed `runQuery` response array.
///
/// Elements without a document carry only read metadata.
#[derive(Debug, Deserialize)]
pub struct RunQueryItem {
    #[serde(default)]
    pub document: Option<Document>,
}

/// A Firestore document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, `projects/.../documents/<collection>/<id>`.
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    #[serde(default)]
    pub create_time: Option<String>,
}

impl Document {
    /// Document ID: the last segment of the resource name.
    #[must_use]
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A typed Firestore value. Exactly one member is set.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    #[serde(default)]
    pub string_value: Option<String>,
    /// Encoded as a JSON string by the REST API; some emulators send a number.
    #[serde(default)]
    pub integer_value: Option<serde_json::Value>,
    #[serde(default)]
    pub double_value: Option<f64>,
    #[serde(default)]
    pub boolean_value: Option<bool>,
    #[serde(default)]
    pub timestamp_value: Option<String>,
    #[serde(default)]
    pub null_value: Option<serde_json::Value>,
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.string_value.as_deref()
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match &self.integer_value {
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            Some(serde_json::Value::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        self.double_value
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        self.boolean_value
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<&str> {
        self.timestamp_value.as_deref()
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.null_value.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(RunQueryRequest::newest_first("spectacles")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "structuredQuery": {
                    "from": [{"collectionId": "spectacles"}],
                    "orderBy": [{"field": {"fieldPath": "createdAt"}, "direction": "DESCENDING"}]
                }
            })
        );
    }

    #[test]
    fn test_document_id() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "name": "projects/kenzy/databases/(default)/documents/spectacles/abc123"
        }))
        .unwrap();
        assert_eq!(doc.id(), "abc123");
        assert!(doc.fields.is_empty());
    }

    #[test]
    fn test_integer_value_forms() {
        let as_string: Value = serde_json::from_str(r#"{"integerValue": "12"}"#).unwrap();
        let as_number: Value = serde_json::from_str(r#"{"integerValue": 7}"#).unwrap();
        assert_eq!(as_string.as_i64(), Some(12));
        assert_eq!(as_number.as_i64(), Some(7));
    }

    #[test]
    fn test_metadata_only_item() {
        let items: Vec<RunQueryItem> =
            serde_json::from_str(r#"[{"readTime": "2024-01-01T00:00:00Z"}]"#).unwrap();
        assert!(items.first().unwrap().document.is_none());
    }
}

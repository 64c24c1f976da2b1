//! Stored document model
//!
//! A document is an untyped JSON object stored under `(collection, id)`.
//! Typed records (classes, articles, gallery items) are decoded from it by
//! the collection gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level fields of a document
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Opaque identifier, unique within its collection
    pub id: String,
    pub fields: Fields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the given top-level fields, keeping every other field.
    pub fn merge(&mut self, patch: Fields) {
        merge_fields(&mut self.fields, patch);
        self.updated_at = Utc::now();
    }
}

/// Last-write-wins merge of top-level fields
pub fn merge_fields(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

/// Generate a new document id (32 lowercase hex chars)
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

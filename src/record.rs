// src/record.rs

//! The record model shared by every pipeline component.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unit of content moving through the pipeline.
///
/// A record is an open-ended JSON-style object. The only field the pipeline
/// itself interprets is `tags`, an array of strings naming the record's
/// current classification; everything else belongs to the stages. Records
/// are plain values with no identity beyond their content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    /// Seed record for a discovered content file: `{filename, tags: [tag]}`.
    pub fn seed(filename: &Path, tag: &str) -> Self {
        let mut fields = Map::new();
        fields.insert(
            "filename".to_string(),
            Value::String(filename.display().to_string()),
        );
        fields.insert(
            "tags".to_string(),
            Value::Array(vec![Value::String(tag.to_string())]),
        );
        Self(fields)
    }

    /// The record's tags, in declared order. A missing or non-array `tags`
    /// field reads as no tags; non-string entries are skipped.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0
            .get("tags")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().any(|t| t == tag)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

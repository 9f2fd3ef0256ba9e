//! # Result Projection Module
//!
//! Flattens raw search hits into client-facing document records: all stored
//! source fields plus the document identifier under `"id"`. The identifier
//! is applied after the merge, so a source field literally named `id` is
//! overwritten by the true identifier. Hit order is preserved exactly.

use serde_json::{Map, Value};

/// Client-facing document record: identifier plus flattened source fields
pub type Document = Map<String, Value>;

/// Projects raw hits into [`Document`] records
pub struct ResultProjector;

impl ResultProjector {
    /// Project hits in the order the engine returned them.
    ///
    /// A hit with a missing or malformed source contributes an
    /// identifier-only record rather than an error.
    pub fn project(raw_hits: &[Value]) -> Vec<Document> {
        raw_hits.iter().map(Self::project_hit).collect()
    }

    fn project_hit(hit: &Value) -> Document {
        let mut doc = match hit.get("_source").and_then(Value::as_object) {
            Some(source) => source.clone(),
            None => Map::new(),
        };

        let id = hit.get("_id").and_then(Value::as_str).unwrap_or_default();
        doc.insert("id".to_string(), Value::String(id.to_string()));

        doc
    }
}

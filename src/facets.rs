//! # Facet Normalization Module
//!
//! Converts raw aggregation buckets from the search engine into the fixed,
//! client-stable facet shape. The year facet passes through untouched; the
//! court facet always carries exactly two buckets, SC then HC, whatever the
//! engine returned.

use crate::query::RECOGNIZED_COURTS;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One (key, count) pair within the court facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtBucket {
    pub key: String,
    pub doc_count: u64,
}

/// Court facet wrapper matching the public response shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtFacet {
    pub buckets: Vec<CourtBucket>,
}

/// Facets section of a search response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facets {
    /// Raw year aggregation, passed through unchanged
    pub years: Value,
    /// Fixed-cardinality court facet
    pub courts: CourtFacet,
}

/// Normalizes raw aggregation output into [`Facets`]
pub struct FacetNormalizer;

impl FacetNormalizer {
    /// Normalize the two aggregations requested by the query builder.
    ///
    /// Missing inputs degenerate to an empty year facet and zero-filled
    /// court buckets; this function never fails.
    pub fn normalize(raw_years: Option<&Value>, raw_court_buckets: Option<&Value>) -> Facets {
        let years = raw_years
            .cloned()
            .unwrap_or_else(|| json!({ "buckets": [] }));

        // Fixed buckets first, raw counts folded in after, so the output
        // order and cardinality never depend on the engine.
        let mut buckets: Vec<CourtBucket> = RECOGNIZED_COURTS
            .iter()
            .map(|key| CourtBucket {
                key: (*key).to_string(),
                doc_count: 0,
            })
            .collect();

        if let Some(raw) = raw_court_buckets.and_then(Value::as_array) {
            for bucket in raw {
                let key = bucket.get("key").and_then(Value::as_str).unwrap_or("");
                let count = bucket
                    .get("doc_count")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);

                match buckets.iter_mut().find(|b| b.key == key) {
                    Some(fixed) => fixed.doc_count = count,
                    None if !key.is_empty() => {
                        tracing::debug!(key, count, "discarding unrecognized court bucket");
                    }
                    None => {}
                }
            }
        }

        Facets {
            years,
            courts: CourtFacet { buckets },
        }
    }
}

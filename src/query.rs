//! # Query Construction Module
//!
//! ## Purpose
//! Converts a validated search request into the JSON query body executed by
//! the search engine collaborator: full-text clause, year range and court
//! filters, deterministic sort, and the fixed aggregation block.
//!
//! ## Input/Output Specification
//! - **Input**: Validated [`SearchRequest`] values
//! - **Output**: [`EngineQuery`] bodies, fully determined by their input
//! - **Purity**: No side effects; invalid parameters never reach this module
//!
//! ## Key Features
//! - Year bounds left-zero-padded to 4 digits before filtering
//! - Court filter derived from the identifier prefix, SC/HC only
//! - Secondary identifier tiebreak so pagination is stable under year ties

use crate::config::SearchDefaults;
use crate::errors::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// Keyword field holding the judgment year inside the indexed metadata
const YEAR_FIELD: &str = "JudgmentMetadata.CaseDetails.JudgmentYear.keyword";

/// Court codes recognized by the court filter and the court facet
pub const RECOGNIZED_COURTS: [&str; 2] = ["SC", "HC"];

/// Bucket cap for both aggregations; wide enough to observe court codes
/// beyond SC/HC even though only SC/HC survive normalization
const AGGREGATION_SIZE: u32 = 50;

/// Sort direction for the year field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(GatewayError::validation(
                "sortOrder",
                format!("'{}' is not one of: asc, desc", other),
            )),
        }
    }
}

/// Validated search request. Construction via [`SearchRequest::from_raw`]
/// enforces the page and size bounds, so query construction is total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub page: u32,
    pub size: u32,
    pub year_from: Option<String>,
    pub year_to: Option<String>,
    pub court: Option<String>,
    pub sort_order: SortOrder,
}

impl SearchRequest {
    /// Validate raw request parameters into a [`SearchRequest`].
    ///
    /// Bounds violations and malformed sort orders are validation failures
    /// here, never query-construction concerns.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw(
        query: Option<String>,
        page: Option<u32>,
        size: Option<u32>,
        year_from: Option<String>,
        year_to: Option<String>,
        court: Option<String>,
        sort_order: Option<String>,
        defaults: &SearchDefaults,
    ) -> Result<Self> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(GatewayError::validation("page", "must be at least 1"));
        }

        let size = size.unwrap_or(defaults.default_page_size);
        if size < 1 || size > defaults.max_page_size {
            return Err(GatewayError::validation(
                "size",
                format!("must be between 1 and {}", defaults.max_page_size),
            ));
        }

        let sort_order = match sort_order {
            Some(raw) => raw.parse()?,
            None => defaults
                .default_sort_order
                .parse()
                .map_err(|_| GatewayError::Config {
                    message: "default sort order is not asc/desc".to_string(),
                })?,
        };

        Ok(Self {
            query,
            page,
            size,
            year_from,
            year_to,
            court,
            sort_order,
        })
    }

    /// Pagination offset: `(page - 1) * size`
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

/// Query body for one search engine call. A pure data product: two
/// identical requests produce byte-identical bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineQuery {
    pub body: Value,
}

/// Left-pad a year bound to exactly 4 digits ("5" -> "0005")
fn pad_year(raw: &str) -> String {
    format!("{:0>4}", raw)
}

/// Builds engine query bodies from validated requests
pub struct QueryBuilder;

impl QueryBuilder {
    /// Build the engine query for a search request.
    ///
    /// The conjunction is never empty: with no query text a match-everything
    /// clause takes the place of the full-text clause.
    pub fn build(request: &SearchRequest) -> EngineQuery {
        let mut must: Vec<Value> = Vec::new();

        if let Some(q) = request.query.as_deref() {
            if !q.is_empty() {
                must.push(json!({
                    "multi_match": {
                        "query": q,
                        "fields": ["*"]
                    }
                }));
            }
        }

        if request.year_from.is_some() || request.year_to.is_some() {
            let mut range = Map::new();
            if let Some(from) = request.year_from.as_deref() {
                range.insert("gte".to_string(), json!(pad_year(from)));
            }
            if let Some(to) = request.year_to.as_deref() {
                range.insert("lte".to_string(), json!(pad_year(to)));
            }
            must.push(json!({ "range": { (YEAR_FIELD): range } }));
        }

        // Court codes live in the first two characters of the document
        // identifier, not in a source field. Unrecognized values add no
        // clause at all.
        if let Some(court) = request.court.as_deref() {
            if RECOGNIZED_COURTS.contains(&court) {
                must.push(json!({
                    "script": {
                        "script": {
                            "source": "doc['_id'].value.startsWith(params.prefix)",
                            "params": { "prefix": court }
                        }
                    }
                }));
            }
        }

        if must.is_empty() {
            must.push(json!({ "match_all": {} }));
        }

        let body = json!({
            "query": { "bool": { "must": must } },
            // Identifier tiebreak keeps page contents identical across
            // repeated calls when years collide.
            "sort": [
                { (YEAR_FIELD): { "order": request.sort_order.as_str() } },
                { "_id": { "order": "asc" } }
            ],
            "aggs": {
                "years": {
                    "terms": {
                        "field": YEAR_FIELD,
                        "size": AGGREGATION_SIZE,
                        "order": { "_key": "desc" }
                    }
                },
                "courts": {
                    "terms": {
                        "script": {
                            "source": "doc['_id'].value.substring(0,2)",
                            "lang": "painless"
                        },
                        "size": AGGREGATION_SIZE
                    }
                }
            },
            "from": request.offset(),
            "size": request.size
        });

        EngineQuery { body }
    }
}

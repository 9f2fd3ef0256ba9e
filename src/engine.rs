//! # Search Engine Client Module
//!
//! ## Purpose
//! HTTP client for the document-search engine collaborator. Executes query
//! bodies against the configured index, runs completion suggestions, and
//! probes reachability for the health endpoint.
//!
//! ## Input/Output Specification
//! - **Input**: Engine query bodies produced by the query builder
//! - **Output**: Raw totals, hits, and aggregation buckets for downstream
//!   projection and facet normalization
//! - **Transport**: JSON over HTTP with optional basic auth and a bounded
//!   per-call timeout
//!
//! The engine is a black box here: this module owns the wire protocol and
//! nothing else. Query semantics live in the query builder; response
//! shaping lives in projection and facet normalization.

use crate::config::EngineConfig;
use crate::errors::{GatewayError, Result};
use crate::query::EngineQuery;
use serde_json::{json, Value};
use std::time::Duration;

/// Raw search engine response, consumed transiently per request
#[derive(Debug, Clone)]
pub struct EngineResponse {
    pub total: u64,
    pub hits: Vec<Value>,
    pub aggregations: Value,
}

/// Client for the search engine collaborator
pub struct EngineClient {
    config: EngineConfig,
    client: reqwest::Client,
}

impl EngineClient {
    /// Create an engine client from configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GatewayError::Config {
                message: format!("Failed to build engine HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }

    /// Execute a search query against the configured index
    pub async fn search(&self, query: &EngineQuery) -> Result<EngineResponse> {
        let url = format!("{}/{}/_search", self.config.base_url, self.config.index);
        let response = self
            .authorized(self.client.post(&url))
            .json(&query.body)
            .send()
            .await
            .map_err(|e| GatewayError::SearchEngineUnavailable {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::SearchEngineUnavailable {
                details: format!("search returned {}: {}", status, body),
            });
        }

        let value: Value =
            response
                .json()
                .await
                .map_err(|e| GatewayError::SearchEngineUnavailable {
                    details: format!("decoding search response: {}", e),
                })?;

        Ok(Self::parse_response(value))
    }

    /// Completion suggestions for a prefix, in engine order
    pub async fn suggest(&self, prefix: &str, size: u32) -> Result<Vec<String>> {
        let url = format!("{}/{}/_search", self.config.base_url, self.config.index);
        let body = json!({
            "suggest": {
                "judgment-suggest": {
                    "prefix": prefix,
                    "completion": {
                        "field": "suggest",
                        "skip_duplicates": true,
                        "size": size
                    }
                }
            }
        });

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::SearchEngineUnavailable {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::SearchEngineUnavailable {
                details: format!("suggest returned {}", status),
            });
        }

        let value: Value =
            response
                .json()
                .await
                .map_err(|e| GatewayError::SearchEngineUnavailable {
                    details: format!("decoding suggest response: {}", e),
                })?;

        let options = value["suggest"]["judgment-suggest"][0]["options"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        Ok(options
            .iter()
            .filter_map(|opt| opt.get("text").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// Reachability probe for the health endpoint; never errors
    pub async fn ping(&self) -> bool {
        match self
            .authorized(self.client.get(&self.config.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("engine ping failed: {}", e);
                false
            }
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.username {
            Some(user) => builder.basic_auth(user, self.config.password.as_ref()),
            None => builder,
        }
    }

    fn parse_response(value: Value) -> EngineResponse {
        let total = value["hits"]["total"]["value"].as_u64().unwrap_or(0);
        let hits = value["hits"]["hits"].as_array().cloned().unwrap_or_default();
        let aggregations = value.get("aggregations").cloned().unwrap_or(Value::Null);

        EngineResponse {
            total,
            hits,
            aggregations,
        }
    }
}

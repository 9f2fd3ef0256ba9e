//! # Search Gateway Module
//!
//! ## Purpose
//! Orchestrates the search pipeline: query construction, the engine call,
//! then facet normalization and result projection over the raw response.
//! Separately orchestrates asset-URL resolution through the locator.
//!
//! ## Input/Output Specification
//! - **Input**: Validated search requests, autocomplete prefixes, document
//!   identifiers
//! - **Output**: Assembled search responses, suggestion lists, presigned
//!   asset URLs
//! - **Failure domains**: Search and asset resolution fail independently;
//!   a missing asset mapping never affects search traffic
//!
//! Autocomplete failures are surfaced as errors from here. Collapsing them
//! into an empty suggestion list is a presentation decision the API layer
//! makes, so "no suggestions" and "collaborator down" stay distinguishable
//! in the core.

use crate::assets::AssetLocator;
use crate::config::Config;
use crate::engine::EngineClient;
use crate::errors::{GatewayError, Result};
use crate::facets::{FacetNormalizer, Facets};
use crate::projection::{Document, ResultProjector};
use crate::query::{QueryBuilder, SearchRequest};
use serde::Serialize;
use std::sync::Arc;

/// Assembled search response matching the public contract
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub total: u64,
    pub results: Vec<Document>,
    pub facets: Facets,
}

/// Orchestrates the search pipeline and asset resolution
pub struct SearchGateway {
    config: Arc<Config>,
    engine: Arc<EngineClient>,
    assets: Option<Arc<AssetLocator>>,
}

impl SearchGateway {
    /// Create the gateway over its collaborators. `assets` is `None` when
    /// the mapping could not be built at startup; asset endpoints then
    /// report unavailable while search keeps serving.
    pub fn new(
        config: Arc<Config>,
        engine: Arc<EngineClient>,
        assets: Option<Arc<AssetLocator>>,
    ) -> Self {
        Self {
            config,
            engine,
            assets,
        }
    }

    /// Execute a search request end to end
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let query = QueryBuilder::build(request);
        let response = self.engine.search(&query).await?;

        let results = ResultProjector::project(&response.hits);
        let facets = FacetNormalizer::normalize(
            response.aggregations.get("years"),
            response
                .aggregations
                .get("courts")
                .and_then(|courts| courts.get("buckets")),
        );

        Ok(SearchResponse {
            total: response.total,
            results,
            facets,
        })
    }

    /// Autocomplete suggestions for a prefix. Engine failures are errors
    /// here; the API layer decides how to present them.
    pub async fn autocomplete(&self, prefix: &str) -> Result<Vec<String>> {
        self.engine
            .suggest(prefix, self.config.search.suggest_size)
            .await
    }

    /// Resolve a document identifier to a presigned asset URL
    pub fn asset_url(&self, doc_id: &str) -> Result<String> {
        match &self.assets {
            Some(locator) => locator.resolve(doc_id),
            None => Err(GatewayError::AssetsUnavailable),
        }
    }

    /// Engine reachability for the health endpoint
    pub async fn engine_reachable(&self) -> bool {
        self.engine.ping().await
    }

    /// Asset mapping sizes, `None` while the asset domain is unavailable
    pub fn asset_stats(&self) -> Option<(usize, usize)> {
        self.assets.as_ref().map(|locator| locator.mapping_stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::query::SortOrder;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer) -> SearchGateway {
        let mut config = Config::default();
        config.engine.base_url = server.uri();
        let config = Arc::new(config);
        let engine = Arc::new(EngineClient::new(config.engine.clone()).unwrap());
        SearchGateway::new(config, engine, None)
    }

    fn default_request() -> SearchRequest {
        SearchRequest {
            query: None,
            page: 1,
            size: 10,
            year_from: None,
            year_to: None,
            court: None,
            sort_order: SortOrder::Desc,
        }
    }

    #[tokio::test]
    async fn search_assembles_projected_results_and_fixed_facets() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/judgments-index/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": {
                    "total": { "value": 3 },
                    "hits": [
                        { "_id": "SC0001", "_source": { "id": "wrong", "Title": "X" } }
                    ]
                },
                "aggregations": {
                    "years": { "buckets": [{ "key": "2019", "doc_count": 3 }] },
                    "courts": { "buckets": [
                        { "key": "SC", "doc_count": 2 },
                        { "key": "TR", "doc_count": 1 }
                    ]}
                }
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let response = gateway.search(&default_request()).await.unwrap();

        assert_eq!(response.total, 3);
        assert_eq!(response.results[0]["id"], json!("SC0001"));
        assert_eq!(response.results[0]["Title"], json!("X"));

        let buckets = &response.facets.courts.buckets;
        assert_eq!(buckets.len(), 2);
        assert_eq!((buckets[0].key.as_str(), buckets[0].doc_count), ("SC", 2));
        assert_eq!((buckets[1].key.as_str(), buckets[1].doc_count), ("HC", 0));
        assert_eq!(response.facets.years["buckets"][0]["key"], json!("2019"));
    }

    #[tokio::test]
    async fn search_with_missing_aggregations_still_returns_fixed_buckets() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": { "total": { "value": 0 }, "hits": [] }
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let response = gateway.search(&default_request()).await.unwrap();
        assert_eq!(response.total, 0);
        assert_eq!(response.facets.courts.buckets.len(), 2);
    }

    #[tokio::test]
    async fn autocomplete_surfaces_engine_failure_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let err = gateway.autocomplete("lan").await.unwrap_err();
        assert!(matches!(err, GatewayError::SearchEngineUnavailable { .. }));
    }

    #[tokio::test]
    async fn asset_url_without_mapping_reports_unavailable() {
        let server = MockServer::start().await;
        let gateway = gateway_for(&server);
        let err = gateway.asset_url("D1").unwrap_err();
        assert!(matches!(err, GatewayError::AssetsUnavailable));
    }
}

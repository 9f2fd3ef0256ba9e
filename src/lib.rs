//! # Judgment Search Gateway
//!
//! ## Overview
//! This library implements a search gateway over a corpus of legal
//! judgments: structured search parameters are translated into queries
//! against a document-search engine, the engine's faceted aggregation
//! output is normalized into a stable client-facing shape, and opaque
//! document identifiers are resolved into time-limited signed URLs for the
//! underlying PDF assets.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `query`: request validation and engine query construction
//! - `facets`: normalization of raw aggregation buckets
//! - `projection`: raw hits to client-facing document records
//! - `engine`: HTTP client for the search engine collaborator
//! - `storage`: HTTP client for the object storage collaborator
//! - `assets`: startup-built identifier-to-asset mapping and resolution
//! - `gateway`: orchestration of the search and asset pipelines
//! - `api`: REST endpoints, validation, CORS, error translation
//! - `config`: configuration management and settings
//! - `errors`: centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: HTTP search requests, autocomplete prefixes, document ids
//! - **Output**: Paged search results with facets, suggestion lists,
//!   presigned PDF retrieval URLs
//! - **Determinism**: Identical requests against an unchanged corpus yield
//!   identical totals, ordering, and facet buckets

// Core modules
pub mod api;
pub mod assets;
pub mod config;
pub mod engine;
pub mod errors;
pub mod facets;
pub mod gateway;
pub mod projection;
pub mod query;
pub mod storage;

// Re-exports for convenience
pub use config::Config;
pub use errors::{GatewayError, Result};
pub use gateway::{SearchGateway, SearchResponse};
pub use query::{QueryBuilder, SearchRequest, SortOrder};

use std::sync::Arc;

/// Application state shared across request handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub gateway: Arc<gateway::SearchGateway>,
}

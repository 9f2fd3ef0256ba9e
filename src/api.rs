//! # API Server Module
//!
//! ## Purpose
//! REST API server for the judgment search gateway: request validation,
//! CORS, route wiring, and the single point where internal errors become
//! HTTP responses.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with search parameters, suggestion prefixes,
//!   document identifiers
//! - **Output**: JSON responses with search results, suggestions, signed
//!   asset URLs, and health status
//! - **Endpoints**: Search, autocomplete, asset URL resolution, health
//!
//! ## Key Features
//! - Parameter validation before the core pipeline runs (422 on violation)
//! - CORS origins driven by configuration
//! - Kind-specific not-found messages for the two asset resolution stages
//! - Autocomplete failures collapse to an empty list at this layer only,
//!   preserving the public contract while the core keeps the distinction

use crate::errors::{GatewayError, Result};
use crate::query::SearchRequest;
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

/// API server owning the shared application state
pub struct ApiServer {
    app_state: crate::AppState,
}

/// Raw query parameters for `/api/search`, validated into a
/// [`SearchRequest`] before any query is built
#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    page: Option<u32>,
    size: Option<u32>,
    #[serde(rename = "yearFrom")]
    year_from: Option<String>,
    #[serde(rename = "yearTo")]
    year_to: Option<String>,
    court: Option<String>,
    #[serde(rename = "sortOrder")]
    sort_order: Option<String>,
}

/// Query parameters for `/api/autocomplete`
#[derive(Debug, Deserialize)]
struct AutocompleteParams {
    q: String,
}

/// Query parameters for `/api/get-pdf-url`
#[derive(Debug, Deserialize)]
struct AssetUrlParams {
    doc_id: String,
}

impl ApiServer {
    /// Create new API server
    pub fn new(app_state: crate::AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server until shutdown
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.app_state.config.server.host, self.app_state.config.server.port
        );
        let origins = self.app_state.config.server.cors_allowed_origins.clone();

        tracing::info!("Starting API server on {}", bind_addr);

        let server = HttpServer::new(move || {
            let mut cors = Cors::default()
                .allowed_methods(vec!["GET"])
                .allow_any_header()
                .supports_credentials()
                .max_age(3600);
            for origin in &origins {
                cors = cors.allowed_origin(origin);
            }

            App::new()
                .app_data(web::Data::new(self.app_state.clone()))
                .wrap(cors)
                .configure(routes)
        })
        .bind(&bind_addr)
        .map_err(|e| GatewayError::Internal {
            message: format!("Failed to bind server to {}: {}", bind_addr, e),
        })?
        .run();

        server.await.map_err(|e| GatewayError::Internal {
            message: format!("Server error: {}", e),
        })?;

        Ok(())
    }
}

/// Route table, shared between the server and the handler tests
fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/search", web::get().to(search_handler))
        .route("/api/autocomplete", web::get().to(autocomplete_handler))
        .route("/api/get-pdf-url", web::get().to(asset_url_handler))
        .route("/", web::get().to(health_handler));
}

/// Translate a gateway error into its HTTP response. The one place where
/// the error taxonomy meets status codes.
fn error_response(err: &GatewayError) -> HttpResponse {
    if err.status_code().is_server_error() {
        error!(category = err.category(), "request failed: {}", err);
    } else {
        warn!(category = err.category(), "request rejected: {}", err);
    }

    HttpResponse::build(err.status_code()).json(json!({
        "error": err.category(),
        "message": err.to_string(),
    }))
}

/// Search endpoint handler
async fn search_handler(
    app_state: web::Data<crate::AppState>,
    params: web::Query<SearchParams>,
) -> ActixResult<HttpResponse> {
    let params = params.into_inner();
    let request = match SearchRequest::from_raw(
        params.q,
        params.page,
        params.size,
        params.year_from,
        params.year_to,
        params.court,
        params.sort_order,
        &app_state.config.search,
    ) {
        Ok(request) => request,
        Err(e) => return Ok(error_response(&e)),
    };

    match app_state.gateway.search(&request).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Autocomplete endpoint handler.
///
/// Engine failures are logged and collapsed to an empty suggestion list,
/// the contract the original clients rely on.
async fn autocomplete_handler(
    app_state: web::Data<crate::AppState>,
    params: web::Query<AutocompleteParams>,
) -> ActixResult<HttpResponse> {
    match app_state.gateway.autocomplete(&params.q).await {
        Ok(suggestions) => Ok(HttpResponse::Ok().json(suggestions)),
        Err(e) => {
            warn!("autocomplete degraded to empty result: {}", e);
            Ok(HttpResponse::Ok().json(json!([])))
        }
    }
}

/// Asset URL endpoint handler
async fn asset_url_handler(
    app_state: web::Data<crate::AppState>,
    params: web::Query<AssetUrlParams>,
) -> ActixResult<HttpResponse> {
    match app_state.gateway.asset_url(&params.doc_id) {
        Ok(url) => Ok(HttpResponse::Ok().json(json!({ "url": url }))),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Health endpoint handler
async fn health_handler(app_state: web::Data<crate::AppState>) -> ActixResult<HttpResponse> {
    let engine_reachable = app_state.gateway.engine_reachable().await;
    let assets = match app_state.gateway.asset_stats() {
        Some((documents, objects)) => json!({
            "available": true,
            "documents": documents,
            "objects": objects,
        }),
        None => json!({ "available": false }),
    };

    Ok(HttpResponse::Ok().json(json!({
        "status": if engine_reachable { "healthy" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "engine_reachable": engine_reachable,
        "assets": assets,
    })))
}

//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the judgment search gateway. Every fallible
//! path in the crate funnels into [`GatewayError`], and the API layer is the
//! single place where errors are translated into HTTP responses.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from request validation, the search engine
//!   collaborator, and the object storage collaborator
//! - **Output**: Structured error variants with enough context for logs and
//!   for kind-specific client messages
//! - **Error Categories**: Validation, Search engine, Storage, Asset
//!   resolution, Configuration, Startup
//!
//! ## Key Features
//! - Two distinct not-found kinds for asset resolution, so a stale manifest
//!   and a stale storage listing stay distinguishable in logs and tests
//! - One-shot translation to HTTP status codes at the API boundary
//! - Automatic conversion from collaborator transport errors

use actix_web::http::StatusCode;
use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Error types for the judgment search gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Search engine collaborator unreachable or returned a failure
    #[error("search engine error: {details}")]
    SearchEngineUnavailable { details: String },

    /// Object storage collaborator unreachable or returned a failure
    #[error("object storage error: {details}")]
    StorageUnavailable { details: String },

    /// Malformed request parameters, rejected before query construction
    #[error("validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// Stage-one resolver miss: no manifest entry for the identifier
    #[error("mapping not found for document '{doc_id}'")]
    MappingNotFound { doc_id: String },

    /// Stage-two resolver miss: manifest names a file the storage
    /// listing never produced
    #[error("asset '{filename}' not found in storage")]
    AssetNotFound { filename: String },

    /// Asset resolution was disabled because the mapping could not be
    /// built at startup; search traffic is unaffected
    #[error("asset resolution is unavailable")]
    AssetsUnavailable,

    /// Configuration errors
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Fatal startup failures (manifest unreadable, listing failed)
    #[error("startup failed during {stage}: {details}")]
    Startup { stage: String, details: String },

    /// Internal invariant violations
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    /// Error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            GatewayError::SearchEngineUnavailable { .. } => "engine",
            GatewayError::StorageUnavailable { .. } => "storage",
            GatewayError::Validation { .. } => "validation",
            GatewayError::MappingNotFound { .. }
            | GatewayError::AssetNotFound { .. }
            | GatewayError::AssetsUnavailable => "asset",
            GatewayError::Config { .. } | GatewayError::Startup { .. } => "startup",
            GatewayError::Internal { .. } => "internal",
        }
    }

    /// HTTP status for this error. Applied exactly once per request, at the
    /// API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::MappingNotFound { .. } | GatewayError::AssetNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            GatewayError::AssetsUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::SearchEngineUnavailable { .. }
            | GatewayError::StorageUnavailable { .. }
            | GatewayError::Config { .. }
            | GatewayError::Startup { .. }
            | GatewayError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for a validation failure
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        GatewayError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Internal {
            message: format!("JSON error: {}", err),
        }
    }
}

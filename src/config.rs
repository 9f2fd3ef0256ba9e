//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the judgment search gateway,
//! supporting multiple sources (files, environment variables, command line
//! arguments) with validation and type-safe access to all system settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables, CLI arguments
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking, range validation at startup
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Command line arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration files
//! 4. Default values (lowest priority)
//!
//! What used to be divergent copies of the same service are collapsed here:
//! collaborator endpoints, CORS origins, and the default sort order are all
//! configuration values feeding one code path.

use crate::errors::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// Search engine collaborator settings
    pub engine: EngineConfig,
    /// Object storage collaborator settings
    pub storage: StorageConfig,
    /// Search request defaults and bounds
    pub search: SearchDefaults,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Origins allowed by the CORS layer
    pub cors_allowed_origins: Vec<String>,
}

/// Search engine collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the search engine HTTP API
    pub base_url: String,
    /// Index holding the judgment corpus
    pub index: String,
    /// Basic-auth username (optional)
    pub username: Option<String>,
    /// Basic-auth password (optional)
    pub password: Option<String>,
    /// Per-call timeout in seconds
    pub timeout_seconds: u64,
}

/// Object storage collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage endpoint URL (S3-compatible)
    pub endpoint: String,
    /// Signing region
    pub region: String,
    /// Bucket holding manifest and PDF assets
    pub bucket: String,
    /// Access key for request signing
    pub access_key: String,
    /// Secret key for request signing
    pub secret_key: String,
    /// Object key of the identifier-to-filename manifest
    pub manifest_key: String,
    /// Key prefix under which PDF assets live
    pub pdf_prefix: String,
    /// Expiry of issued retrieval URLs in seconds
    pub url_expiry_seconds: u64,
    /// Per-call timeout in seconds
    pub timeout_seconds: u64,
}

/// Search request defaults and bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDefaults {
    /// Page size applied when the request omits one
    pub default_page_size: u32,
    /// Upper bound on the requested page size
    pub max_page_size: u32,
    /// Sort order applied when the request omits one ("asc" or "desc")
    pub default_sort_order: String,
    /// Number of autocomplete suggestions requested from the engine
    pub suggest_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| GatewayError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| GatewayError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("JUDGMENT_GATEWAY_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("JUDGMENT_GATEWAY_PORT") {
            self.server.port = port.parse().map_err(|_| GatewayError::Config {
                message: "Invalid port number in JUDGMENT_GATEWAY_PORT".to_string(),
            })?;
        }
        if let Ok(url) = std::env::var("JUDGMENT_GATEWAY_ENGINE_URL") {
            self.engine.base_url = url;
        }
        if let Ok(index) = std::env::var("JUDGMENT_GATEWAY_ENGINE_INDEX") {
            self.engine.index = index;
        }
        if let Ok(user) = std::env::var("JUDGMENT_GATEWAY_ENGINE_USERNAME") {
            self.engine.username = Some(user);
        }
        if let Ok(pass) = std::env::var("JUDGMENT_GATEWAY_ENGINE_PASSWORD") {
            self.engine.password = Some(pass);
        }
        if let Ok(endpoint) = std::env::var("JUDGMENT_GATEWAY_STORAGE_ENDPOINT") {
            self.storage.endpoint = endpoint;
        }
        if let Ok(key) = std::env::var("JUDGMENT_GATEWAY_STORAGE_ACCESS_KEY") {
            self.storage.access_key = key;
        }
        if let Ok(secret) = std::env::var("JUDGMENT_GATEWAY_STORAGE_SECRET_KEY") {
            self.storage.secret_key = secret;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(GatewayError::validation("server.port", "Port cannot be zero"));
        }

        if self.engine.base_url.is_empty() {
            return Err(GatewayError::validation(
                "engine.base_url",
                "Search engine URL cannot be empty",
            ));
        }

        if self.engine.index.is_empty() {
            return Err(GatewayError::validation(
                "engine.index",
                "Search engine index cannot be empty",
            ));
        }

        if self.storage.bucket.is_empty() {
            return Err(GatewayError::validation(
                "storage.bucket",
                "Storage bucket cannot be empty",
            ));
        }

        if self.storage.url_expiry_seconds == 0 {
            return Err(GatewayError::validation(
                "storage.url_expiry_seconds",
                "URL expiry must be greater than zero",
            ));
        }

        if self.search.default_page_size == 0
            || self.search.default_page_size > self.search.max_page_size
        {
            return Err(GatewayError::validation(
                "search.default_page_size",
                "Default page size must be between 1 and the maximum page size",
            ));
        }

        if !matches!(self.search.default_sort_order.as_str(), "asc" | "desc") {
            return Err(GatewayError::validation(
                "search.default_sort_order",
                "Default sort order must be 'asc' or 'desc'",
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            engine: EngineConfig {
                base_url: "http://127.0.0.1:9200".to_string(),
                index: "judgments-index".to_string(),
                username: None,
                password: None,
                timeout_seconds: 30,
            },
            storage: StorageConfig {
                endpoint: "http://127.0.0.1:9000".to_string(),
                region: "us-east-1".to_string(),
                bucket: "judgments".to_string(),
                access_key: String::new(),
                secret_key: String::new(),
                manifest_key: "mappings/doc-filename.txt".to_string(),
                pdf_prefix: "pdf-cleaned/".to_string(),
                url_expiry_seconds: 3600,
                timeout_seconds: 30,
            },
            search: SearchDefaults {
                default_page_size: 10,
                max_page_size: 100,
                default_sort_order: "desc".to_string(),
                suggest_size: 5,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_port_rejected() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_default_sort_order_rejected() {
        let mut config = Config::default();
        config.search.default_sort_order = "newest".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_page_size_bounds_rejected() {
        let mut config = Config::default();
        config.search.default_page_size = 200;
        config.search.max_page_size = 100;
        assert!(config.validate().is_err());
    }
}

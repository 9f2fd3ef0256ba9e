//! # Asset Resolution Module
//!
//! ## Purpose
//! Resolves opaque document identifiers into time-limited retrieval URLs for
//! the underlying PDF assets, through a two-level mapping built once at
//! startup and read-only for the rest of the process lifetime.
//!
//! ## Input/Output Specification
//! - **Input**: The manifest object (lines of `id-filename`) and an
//!   exhaustive listing of the PDF storage prefix
//! - **Output**: Presigned retrieval URLs with a fixed expiry
//! - **Lifecycle**: Built before the server accepts traffic, never
//!   refreshed; a restart is the only refresh mechanism
//!
//! ## Key Features
//! - Immutable snapshot passed by handle, no ambient global state
//! - Malformed manifest lines are skipped and logged, never fatal
//! - The two lookup stages fail with distinct not-found kinds, so a stale
//!   manifest and a stale storage listing stay distinguishable

use crate::config::StorageConfig;
use crate::errors::{GatewayError, Result};
use crate::storage::ObjectStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Immutable two-level mapping from document identifier to storage key
#[derive(Debug, Default)]
pub struct AssetMapping {
    doc_to_filename: HashMap<String, String>,
    filename_to_key: HashMap<String, String>,
}

impl AssetMapping {
    /// Build the snapshot from manifest text and a full prefix listing
    pub fn from_parts(manifest: &str, keys: Vec<String>) -> Self {
        let doc_to_filename = Self::parse_manifest(manifest);
        let filename_to_key = Self::index_by_filename(keys);
        Self {
            doc_to_filename,
            filename_to_key,
        }
    }

    /// Parse manifest lines of the form `id-filename`. Lines without a
    /// separator are skipped and logged, not fatal.
    fn parse_manifest(manifest: &str) -> HashMap<String, String> {
        let mut mapping = HashMap::new();
        let mut skipped = 0usize;

        for line in manifest.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.split_once('-') {
                Some((doc_id, filename)) if !doc_id.is_empty() && !filename.is_empty() => {
                    mapping.insert(doc_id.to_string(), filename.to_string());
                }
                _ => {
                    warn!(line, "skipping malformed manifest line");
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            warn!(skipped, "manifest contained malformed lines");
        }
        mapping
    }

    /// Index listed keys by their trailing path segment
    fn index_by_filename(keys: Vec<String>) -> HashMap<String, String> {
        let mut index = HashMap::new();
        for key in keys {
            let filename = key.rsplit('/').next().unwrap_or("").to_string();
            if filename.is_empty() {
                // Directory placeholder objects carry no filename
                continue;
            }
            index.insert(filename, key);
        }
        index
    }

    /// Number of manifest entries observed at startup
    pub fn document_count(&self) -> usize {
        self.doc_to_filename.len()
    }

    /// Number of storage objects observed at startup
    pub fn asset_count(&self) -> usize {
        self.filename_to_key.len()
    }

    fn filename_for(&self, doc_id: &str) -> Option<&str> {
        self.doc_to_filename.get(doc_id).map(String::as_str)
    }

    fn key_for(&self, filename: &str) -> Option<&str> {
        self.filename_to_key.get(filename).map(String::as_str)
    }
}

/// Resolves document identifiers to presigned asset URLs
pub struct AssetLocator {
    store: Arc<ObjectStore>,
    mapping: AssetMapping,
    url_expiry_seconds: u64,
}

impl AssetLocator {
    /// Build the locator at startup.
    ///
    /// An unreadable manifest or a failed prefix listing is fatal for the
    /// asset domain: no asset-resolution traffic may be served without the
    /// mapping. Search is independent and unaffected.
    pub async fn build(store: Arc<ObjectStore>, config: &StorageConfig) -> Result<Self> {
        let manifest = store
            .get_object(&config.manifest_key)
            .await
            .map_err(|e| GatewayError::Startup {
                stage: "manifest fetch".to_string(),
                details: e.to_string(),
            })?;

        let keys = store
            .list_prefix(&config.pdf_prefix)
            .await
            .map_err(|e| GatewayError::Startup {
                stage: "storage enumeration".to_string(),
                details: e.to_string(),
            })?;

        let mapping = AssetMapping::from_parts(&manifest, keys);
        info!(
            documents = mapping.document_count(),
            assets = mapping.asset_count(),
            "asset mapping built"
        );

        Ok(Self {
            store,
            mapping,
            url_expiry_seconds: config.url_expiry_seconds,
        })
    }

    /// Construct a locator over an already-built snapshot
    pub fn with_mapping(
        store: Arc<ObjectStore>,
        mapping: AssetMapping,
        url_expiry_seconds: u64,
    ) -> Self {
        Self {
            store,
            mapping,
            url_expiry_seconds,
        }
    }

    /// Resolve a document identifier to a presigned retrieval URL.
    ///
    /// Stage one misses mean the manifest never mapped the identifier;
    /// stage two misses mean the manifest names a file the storage listing
    /// never produced. Both are normal not-found outcomes.
    pub fn resolve(&self, doc_id: &str) -> Result<String> {
        let filename = self
            .mapping
            .filename_for(doc_id)
            .ok_or_else(|| GatewayError::MappingNotFound {
                doc_id: doc_id.to_string(),
            })?;

        let key = self
            .mapping
            .key_for(filename)
            .ok_or_else(|| GatewayError::AssetNotFound {
                filename: filename.to_string(),
            })?;

        self.store.presign_pdf_get(key, self.url_expiry_seconds)
    }

    /// Mapping sizes for the health endpoint
    pub fn mapping_stats(&self) -> (usize, usize) {
        (self.mapping.document_count(), self.mapping.asset_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    fn test_store() -> Arc<ObjectStore> {
        let config = StorageConfig {
            endpoint: "https://storage.example.com".to_string(),
            region: "us-east-1".to_string(),
            bucket: "judgments".to_string(),
            access_key: "AKIDEXAMPLE".to_string(),
            secret_key: "wJalrXUtnFEMI".to_string(),
            manifest_key: "mappings/doc-filename.txt".to_string(),
            pdf_prefix: "pdf-cleaned/".to_string(),
            url_expiry_seconds: 3600,
            timeout_seconds: 5,
        };
        Arc::new(ObjectStore::new(config).unwrap())
    }

    fn locator(manifest: &str, keys: Vec<&str>) -> AssetLocator {
        let mapping =
            AssetMapping::from_parts(manifest, keys.into_iter().map(str::to_string).collect());
        AssetLocator::with_mapping(test_store(), mapping, 3600)
    }

    #[test]
    fn manifest_lines_without_separator_are_skipped() {
        let mapping = AssetMapping::from_parts(
            "D1-case.pdf\ngarbage\n\nD2-other.pdf\n",
            vec![],
        );
        assert_eq!(mapping.document_count(), 2);
        assert_eq!(mapping.filename_for("D1"), Some("case.pdf"));
        assert_eq!(mapping.filename_for("D2"), Some("other.pdf"));
        assert_eq!(mapping.filename_for("garbage"), None);
    }

    #[test]
    fn filename_keeps_dashes_after_first_separator() {
        let mapping = AssetMapping::from_parts("D9-case-v2-final.pdf\n", vec![]);
        assert_eq!(mapping.filename_for("D9"), Some("case-v2-final.pdf"));
    }

    #[test]
    fn keys_are_indexed_by_trailing_segment() {
        let mapping = AssetMapping::from_parts(
            "",
            vec![
                "pdf-cleaned/case.pdf".to_string(),
                "pdf-cleaned/2019/deep.pdf".to_string(),
                "pdf-cleaned/".to_string(),
            ],
        );
        assert_eq!(mapping.asset_count(), 2);
        assert_eq!(mapping.key_for("case.pdf"), Some("pdf-cleaned/case.pdf"));
        assert_eq!(mapping.key_for("deep.pdf"), Some("pdf-cleaned/2019/deep.pdf"));
    }

    #[test]
    fn resolve_returns_url_for_the_full_storage_key() {
        let locator = locator("D1-case.pdf\n", vec!["pdf-cleaned/case.pdf"]);
        let url = locator.resolve("D1").unwrap();
        assert!(url.contains("/judgments/pdf-cleaned/case.pdf?"));
        assert!(url.contains("X-Amz-Expires=3600"));
    }

    #[test]
    fn resolve_unknown_identifier_is_mapping_not_found() {
        let locator = locator("D1-case.pdf\n", vec!["pdf-cleaned/case.pdf"]);
        let err = locator.resolve("UNKNOWN").unwrap_err();
        assert!(matches!(err, GatewayError::MappingNotFound { ref doc_id } if doc_id == "UNKNOWN"));
    }

    #[test]
    fn resolve_unlisted_filename_is_asset_not_found() {
        let locator = locator("D2-ghost.pdf\n", vec!["pdf-cleaned/case.pdf"]);
        let err = locator.resolve("D2").unwrap_err();
        assert!(
            matches!(err, GatewayError::AssetNotFound { ref filename } if filename == "ghost.pdf")
        );
    }
}

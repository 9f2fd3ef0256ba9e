//! # Object Storage Module
//!
//! ## Purpose
//! HTTP client for the S3-compatible object storage collaborator: fetches
//! the manifest object, enumerates the PDF prefix, and produces time-limited
//! presigned retrieval URLs.
//!
//! ## Input/Output Specification
//! - **Input**: Object keys, key prefixes, signing credentials from config
//! - **Output**: Object bodies, exhaustive key listings, presigned GET URLs
//! - **Signing**: AWS Signature Version 4 query presigning (UNSIGNED-PAYLOAD,
//!   host-only signed headers)
//!
//! ## Key Features
//! - One signing path for everything: authenticated reads and listing calls
//!   go through the same presigner that issues client-facing URLs
//! - Paginated ListObjectsV2 enumeration, continuation tokens exhausted
//! - Response-header overrides so issued URLs render inline as PDF
//! - Bounded per-call timeout from configuration

use crate::config::StorageConfig;
use crate::errors::{GatewayError, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// Unreserved characters per SigV4: everything else is percent-encoded
const SIGV4_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Client for one bucket of an S3-compatible object store
pub struct ObjectStore {
    config: StorageConfig,
    client: reqwest::Client,
    host: String,
    base_url: String,
}

/// ListObjectsV2 response document
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_continuation_token: Option<String>,
    #[serde(default, rename = "Contents")]
    contents: Vec<ObjectEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ObjectEntry {
    key: String,
}

impl ObjectStore {
    /// Create a store client from configuration
    pub fn new(config: StorageConfig) -> Result<Self> {
        let endpoint: reqwest::Url =
            config
                .endpoint
                .parse()
                .map_err(|e| GatewayError::Config {
                    message: format!("Invalid storage endpoint '{}': {}", config.endpoint, e),
                })?;

        let host_name = endpoint.host_str().ok_or_else(|| GatewayError::Config {
            message: format!("Storage endpoint '{}' has no host", config.endpoint),
        })?;
        // The signed Host header carries the port only when it is not the
        // scheme default, matching what the HTTP client will send.
        let host = match endpoint.port() {
            Some(port) => format!("{}:{}", host_name, port),
            None => host_name.to_string(),
        };
        let base_url = format!("{}://{}", endpoint.scheme(), host);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GatewayError::Config {
                message: format!("Failed to build storage HTTP client: {}", e),
            })?;

        Ok(Self {
            config,
            client,
            host,
            base_url,
        })
    }

    /// Fetch one object in full as text
    pub async fn get_object(&self, key: &str) -> Result<String> {
        let url = self.presign(key, &[], self.config.timeout_seconds, Utc::now())?;
        let response = self.client.get(&url).send().await.map_err(|e| {
            GatewayError::StorageUnavailable {
                details: format!("GET {}: {}", key, e),
            }
        })?;

        if !response.status().is_success() {
            return Err(GatewayError::StorageUnavailable {
                details: format!("GET {} returned {}", key, response.status()),
            });
        }

        response
            .text()
            .await
            .map_err(|e| GatewayError::StorageUnavailable {
                details: format!("reading body of {}: {}", key, e),
            })
    }

    /// Enumerate every key under a prefix, exhausting continuation tokens
    pub async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut params = vec![
                ("list-type".to_string(), "2".to_string()),
                ("prefix".to_string(), prefix.to_string()),
            ];
            if let Some(token) = &continuation {
                params.push(("continuation-token".to_string(), token.clone()));
            }

            let url = self.presign("", &params, self.config.timeout_seconds, Utc::now())?;
            let response = self.client.get(&url).send().await.map_err(|e| {
                GatewayError::StorageUnavailable {
                    details: format!("listing prefix '{}': {}", prefix, e),
                }
            })?;

            if !response.status().is_success() {
                return Err(GatewayError::StorageUnavailable {
                    details: format!("listing prefix '{}' returned {}", prefix, response.status()),
                });
            }

            let body = response
                .text()
                .await
                .map_err(|e| GatewayError::StorageUnavailable {
                    details: format!("reading listing body: {}", e),
                })?;

            let page: ListBucketResult =
                quick_xml::de::from_str(&body).map_err(|e| GatewayError::StorageUnavailable {
                    details: format!("parsing listing response: {}", e),
                })?;

            keys.extend(page.contents.into_iter().map(|entry| entry.key));

            match (page.is_truncated, page.next_continuation_token) {
                (true, Some(token)) => continuation = Some(token),
                _ => break,
            }
        }

        tracing::debug!(prefix, count = keys.len(), "listed storage prefix");
        Ok(keys)
    }

    /// Presigned GET URL for an asset, rendered inline as PDF by browsers
    pub fn presign_pdf_get(&self, key: &str, expiry_seconds: u64) -> Result<String> {
        let params = vec![
            (
                "response-content-disposition".to_string(),
                "inline".to_string(),
            ),
            (
                "response-content-type".to_string(),
                "application/pdf".to_string(),
            ),
        ];
        self.presign(key, &params, expiry_seconds, Utc::now())
    }

    /// SigV4 query presigning. An empty key signs a bucket-level request
    /// (used for listings).
    fn presign(
        &self,
        key: &str,
        extra_params: &[(String, String)],
        expiry_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/s3/aws4_request", datestamp, self.config.region);
        let credential = format!("{}/{}", self.config.access_key, scope);

        let canonical_uri = self.canonical_uri(key);

        let mut params: Vec<(String, String)> = vec![
            ("X-Amz-Algorithm".to_string(), "AWS4-HMAC-SHA256".to_string()),
            ("X-Amz-Credential".to_string(), credential),
            ("X-Amz-Date".to_string(), amz_date.clone()),
            ("X-Amz-Expires".to_string(), expiry_seconds.to_string()),
            ("X-Amz-SignedHeaders".to_string(), "host".to_string()),
        ];
        params.extend_from_slice(extra_params);

        let mut encoded: Vec<(String, String)> = params
            .iter()
            .map(|(name, value)| {
                (
                    utf8_percent_encode(name, SIGV4_ENCODE_SET).to_string(),
                    utf8_percent_encode(value, SIGV4_ENCODE_SET).to_string(),
                )
            })
            .collect();
        encoded.sort_unstable();
        let canonical_query = encoded
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "GET\n{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
            canonical_uri, canonical_query, self.host
        );

        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let mut signing_key =
            hmac_sha256(format!("AWS4{}", self.config.secret_key).as_bytes(), &datestamp)?;
        for part in [self.config.region.as_str(), "s3", "aws4_request"] {
            signing_key = hmac_sha256(&signing_key, part)?;
        }
        let signature = hex::encode(hmac_sha256(&signing_key, &string_to_sign)?);

        Ok(format!(
            "{}{}?{}&X-Amz-Signature={}",
            self.base_url, canonical_uri, canonical_query, signature
        ))
    }

    /// Path-style canonical URI: `/bucket` or `/bucket/key`, each path
    /// segment percent-encoded, separators preserved
    fn canonical_uri(&self, key: &str) -> String {
        let mut uri = format!(
            "/{}",
            utf8_percent_encode(&self.config.bucket, SIGV4_ENCODE_SET)
        );
        if !key.is_empty() {
            for segment in key.split('/') {
                uri.push('/');
                uri.push_str(&utf8_percent_encode(segment, SIGV4_ENCODE_SET).to_string());
            }
        }
        uri
    }
}

fn hmac_sha256(key: &[u8], data: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| GatewayError::Internal {
        message: format!("HMAC key error: {}", e),
    })?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use chrono::TimeZone;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint: &str) -> StorageConfig {
        StorageConfig {
            endpoint: endpoint.to_string(),
            region: "us-east-1".to_string(),
            bucket: "judgments".to_string(),
            access_key: "AKIDEXAMPLE".to_string(),
            secret_key: "wJalrXUtnFEMI".to_string(),
            manifest_key: "mappings/doc-filename.txt".to_string(),
            pdf_prefix: "pdf-cleaned/".to_string(),
            url_expiry_seconds: 3600,
            timeout_seconds: 5,
        }
    }

    #[test]
    fn presigned_url_carries_expiry_and_inline_pdf_overrides() {
        let store = ObjectStore::new(test_config("https://storage.example.com")).unwrap();
        let url = store.presign_pdf_get("pdf-cleaned/case.pdf", 3600).unwrap();

        assert!(url.starts_with("https://storage.example.com/judgments/pdf-cleaned/case.pdf?"));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        assert!(url.contains("response-content-disposition=inline"));
        assert!(url.contains("response-content-type=application%2Fpdf"));

        let signature = url.rsplit("X-Amz-Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn presigning_is_deterministic_for_a_fixed_instant() {
        let store = ObjectStore::new(test_config("https://storage.example.com")).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap();

        let first = store.presign("pdf-cleaned/case.pdf", &[], 3600, now).unwrap();
        let second = store.presign("pdf-cleaned/case.pdf", &[], 3600, now).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("X-Amz-Date=20240517T120000Z"));
        assert!(first.contains("20240517%2Fus-east-1%2Fs3%2Faws4_request"));
    }

    #[test]
    fn canonical_query_parameters_are_sorted() {
        let store = ObjectStore::new(test_config("https://storage.example.com")).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap();
        let url = store
            .presign(
                "",
                &[
                    ("prefix".to_string(), "pdf-cleaned/".to_string()),
                    ("list-type".to_string(), "2".to_string()),
                ],
                300,
                now,
            )
            .unwrap();

        let query = url.split('?').nth(1).unwrap();
        // The signature is appended after signing; everything before it is
        // the canonical query and must be sorted.
        let names: Vec<&str> = query
            .split('&')
            .map(|pair| pair.split('=').next().unwrap())
            .filter(|name| *name != "X-Amz-Signature")
            .collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(query.ends_with(&format!(
            "X-Amz-Signature={}",
            url.rsplit("X-Amz-Signature=").next().unwrap()
        )));
        assert!(query.contains("list-type=2"));
        assert!(query.contains("prefix=pdf-cleaned%2F"));
    }

    #[tokio::test]
    async fn get_object_fetches_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/judgments/mappings/doc-filename.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("D1-case.pdf\n"))
            .mount(&server)
            .await;

        let store = ObjectStore::new(test_config(&server.uri())).unwrap();
        let body = store.get_object("mappings/doc-filename.txt").await.unwrap();
        assert_eq!(body, "D1-case.pdf\n");
    }

    #[tokio::test]
    async fn get_object_maps_error_status_to_storage_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = ObjectStore::new(test_config(&server.uri())).unwrap();
        let err = store.get_object("mappings/doc-filename.txt").await.unwrap_err();
        assert!(matches!(err, GatewayError::StorageUnavailable { .. }));
    }

    #[tokio::test]
    async fn list_prefix_exhausts_continuation_tokens() {
        let server = MockServer::start().await;

        let page_one = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult>
    <IsTruncated>true</IsTruncated>
    <NextContinuationToken>token-1</NextContinuationToken>
    <Contents><Key>pdf-cleaned/a.pdf</Key></Contents>
    <Contents><Key>pdf-cleaned/b.pdf</Key></Contents>
</ListBucketResult>"#;
        let page_two = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult>
    <IsTruncated>false</IsTruncated>
    <Contents><Key>pdf-cleaned/c.pdf</Key></Contents>
</ListBucketResult>"#;

        Mock::given(method("GET"))
            .and(path("/judgments"))
            .and(query_param("continuation-token", "token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_two))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/judgments"))
            .and(query_param("list-type", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_one))
            .mount(&server)
            .await;

        let store = ObjectStore::new(test_config(&server.uri())).unwrap();
        let keys = store.list_prefix("pdf-cleaned/").await.unwrap();
        assert_eq!(
            keys,
            vec!["pdf-cleaned/a.pdf", "pdf-cleaned/b.pdf", "pdf-cleaned/c.pdf"]
        );
    }
}

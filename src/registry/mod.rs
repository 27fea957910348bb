//! Async HTTP lookups of published artifact digests.
//!
//! Each module exposes a `fetch_hash(client, base_url, name, version)` function
//! that returns `Ok(Some(hash))` on success, `Ok(None)` when the registry has
//! no such version or publishes no digest for it, and `Err` on transport,
//! status or decode failures.

pub mod npm;
pub mod pypi;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};

use crate::config::EnrichmentConfig;
use crate::error::{Result, ScanError};
use crate::store::{EnrichmentCandidate, PackageHash};

/// Ecosystems the hash lookups cover, compared case-insensitively.
pub const SUPPORTED_ECOSYSTEMS: &[&str] = &["npm", "pip", "pypi"];

pub fn is_supported(ecosystem: &str) -> bool {
    SUPPORTED_ECOSYSTEMS
        .iter()
        .any(|e| e.eq_ignore_ascii_case(ecosystem.trim()))
}

/// Where the enrichment worker gets digests from.
#[async_trait]
pub trait HashSource: Send + Sync {
    async fn lookup(&self, candidate: &EnrichmentCandidate) -> Result<Option<PackageHash>>;
}

/// Hash lookups against the public npm registry and PyPI.
pub struct RegistryClient {
    client: Client,
    npm_registry_url: String,
    pypi_url: String,
}

impl RegistryClient {
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|source| ScanError::Registry {
                registry: "client".to_string(),
                source,
            })?;
        Ok(Self {
            client,
            npm_registry_url: config.npm_registry_url.trim_end_matches('/').to_string(),
            pypi_url: config.pypi_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl HashSource for RegistryClient {
    async fn lookup(&self, candidate: &EnrichmentCandidate) -> Result<Option<PackageHash>> {
        let name = candidate.name.as_str();
        let version = candidate.version.trim();
        match candidate.ecosystem.trim().to_lowercase().as_str() {
            "npm" => npm::fetch_hash(&self.client, &self.npm_registry_url, name, version).await,
            "pip" | "pypi" => pypi::fetch_hash(&self.client, &self.pypi_url, name, version).await,
            _ => Ok(None),
        }
    }
}

/// GET `url` as JSON. 404 maps to `Ok(None)`.
pub(crate) async fn get_json(client: &Client, registry: &str, url: &str) -> Result<Option<serde_json::Value>> {
    let transport = |source| ScanError::Registry {
        registry: registry.to_string(),
        source,
    };
    let response: Response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(transport)?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(ScanError::RegistryStatus {
            registry: registry.to_string(),
            status: response.status().as_u16(),
        });
    }
    response.json().await.map(Some).map_err(transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_ecosystems() {
        assert!(is_supported("npm"));
        assert!(is_supported("PyPI"));
        assert!(is_supported(" pip "));
        assert!(!is_supported("cargo"));
        assert!(!is_supported(""));
    }

    #[tokio::test]
    async fn test_unsupported_ecosystem_is_none() {
        let client = RegistryClient::new(&EnrichmentConfig::default()).unwrap();
        let candidate = EnrichmentCandidate {
            name: "serde".to_string(),
            version: "1.0.0".to_string(),
            ecosystem: "cargo".to_string(),
            purl: "pkg:cargo/serde@1.0.0".to_string(),
        };
        assert!(client.lookup(&candidate).await.unwrap().is_none());
    }
}

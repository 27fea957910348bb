//! Persistence capability used by the enrichment worker.
//!
//! The production store (a relational or graph database) lives outside this
//! crate. [`MemoryStore`] keeps records in memory and can round-trip them
//! through a JSON file, which is what the CLI uses.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{Result, ScanError};

/// Why a dependency has no hash. Cleared once a hash is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapReason {
    NoVersion,
    UnsupportedEcosystem,
    NotFound,
    FetchError,
}

impl std::fmt::Display for GapReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GapReason::NoVersion => "no_version",
            GapReason::UnsupportedEcosystem => "unsupported_ecosystem",
            GapReason::NotFound => "not_found",
            GapReason::FetchError => "fetch_error",
        };
        write!(f, "{}", s)
    }
}

/// A published artifact digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageHash {
    /// Lowercase algorithm name, e.g. `sha512`.
    pub algorithm: String,
    /// Lowercase hex.
    pub value: String,
    /// Where the digest came from, e.g. `npm` or `pypi`.
    pub source: String,
}

/// One dependency of a product, as the enrichment worker sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentCandidate {
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Free-form ecosystem label as stored (`npm`, `pip`, `PyPI`, ...).
    pub ecosystem: String,
    pub purl: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    #[serde(flatten)]
    pub dependency: EnrichmentCandidate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<PackageHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<GapReason>,
}

impl From<EnrichmentCandidate> for DependencyRecord {
    fn from(dependency: EnrichmentCandidate) -> Self {
        Self {
            dependency,
            hash: None,
            gap: None,
        }
    }
}

#[async_trait]
pub trait DependencyStore: Send + Sync {
    async fn list_dependencies(&self, product_id: &str) -> Result<Vec<EnrichmentCandidate>>;

    /// Purls of the product's dependencies that already carry a hash.
    async fn hashed_purls(&self, product_id: &str) -> Result<HashSet<String>>;

    /// Store the hash and clear any gap reason.
    async fn record_hash(&self, product_id: &str, purl: &str, hash: &PackageHash) -> Result<()>;

    async fn record_gap(&self, product_id: &str, purl: &str, reason: GapReason) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    products: BTreeMap<String, Vec<DependencyRecord>>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    products: Mutex<BTreeMap<String, Vec<DependencyRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store file; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(ScanError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let file: StoreFile = serde_json::from_str(&content)?;
        Ok(Self {
            products: Mutex::new(file.products),
        })
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let file = StoreFile {
            products: self.products.lock().await.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, json).map_err(|source| ScanError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Replace the product's dependency set. Hashes already known for a purl
    /// are carried over.
    pub async fn put_dependencies(&self, product_id: &str, dependencies: Vec<EnrichmentCandidate>) {
        let mut products = self.products.lock().await;
        let previous = products.remove(product_id).unwrap_or_default();
        let records = dependencies
            .into_iter()
            .map(|dep| {
                let hash = previous
                    .iter()
                    .find(|r| r.dependency.purl == dep.purl)
                    .and_then(|r| r.hash.clone());
                DependencyRecord {
                    dependency: dep,
                    hash,
                    gap: None,
                }
            })
            .collect();
        products.insert(product_id.to_string(), records);
    }

    pub async fn records(&self, product_id: &str) -> Vec<DependencyRecord> {
        self.products
            .lock()
            .await
            .get(product_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn update<F>(&self, product_id: &str, purl: &str, apply: F) -> Result<()>
    where
        F: Fn(&mut DependencyRecord) + Send,
    {
        let mut products = self.products.lock().await;
        let records = products
            .get_mut(product_id)
            .ok_or_else(|| ScanError::Store(format!("unknown product '{}'", product_id)))?;
        let mut found = false;
        for record in records.iter_mut().filter(|r| r.dependency.purl == purl) {
            apply(record);
            found = true;
        }
        if found {
            Ok(())
        } else {
            Err(ScanError::Store(format!("no dependency '{}' in product '{}'", purl, product_id)))
        }
    }
}

#[async_trait]
impl DependencyStore for MemoryStore {
    async fn list_dependencies(&self, product_id: &str) -> Result<Vec<EnrichmentCandidate>> {
        Ok(self
            .records(product_id)
            .await
            .into_iter()
            .map(|r| r.dependency)
            .collect())
    }

    async fn hashed_purls(&self, product_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .records(product_id)
            .await
            .into_iter()
            .filter(|r| r.hash.is_some())
            .map(|r| r.dependency.purl)
            .collect())
    }

    async fn record_hash(&self, product_id: &str, purl: &str, hash: &PackageHash) -> Result<()> {
        self.update(product_id, purl, |r| {
            r.hash = Some(hash.clone());
            r.gap = None;
        })
        .await
    }

    async fn record_gap(&self, product_id: &str, purl: &str, reason: GapReason) -> Result<()> {
        self.update(product_id, purl, |r| r.gap = Some(reason)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, version: &str) -> EnrichmentCandidate {
        EnrichmentCandidate {
            name: name.to_string(),
            version: version.to_string(),
            ecosystem: "npm".to_string(),
            purl: format!("pkg:npm/{}@{}", name, version),
        }
    }

    fn sha(value: &str) -> PackageHash {
        PackageHash {
            algorithm: "sha512".to_string(),
            value: value.to_string(),
            source: "npm".to_string(),
        }
    }

    #[tokio::test]
    async fn test_hash_clears_gap() {
        let store = MemoryStore::new();
        store.put_dependencies("p1", vec![candidate("lodash", "4.17.21")]).await;

        store.record_gap("p1", "pkg:npm/lodash@4.17.21", GapReason::NotFound).await.unwrap();
        assert_eq!(store.records("p1").await[0].gap, Some(GapReason::NotFound));

        store.record_hash("p1", "pkg:npm/lodash@4.17.21", &sha("ab")).await.unwrap();
        let record = &store.records("p1").await[0];
        assert_eq!(record.gap, None);
        assert_eq!(record.hash.as_ref().map(|h| h.value.as_str()), Some("ab"));
        assert!(store.hashed_purls("p1").await.unwrap().contains("pkg:npm/lodash@4.17.21"));
    }

    #[tokio::test]
    async fn test_unknown_targets_are_errors() {
        let store = MemoryStore::new();
        assert!(store.record_gap("nope", "pkg:npm/a@1", GapReason::NoVersion).await.is_err());
        store.put_dependencies("p1", vec![candidate("a", "1")]).await;
        assert!(store.record_hash("p1", "pkg:npm/b@1", &sha("00")).await.is_err());
    }

    #[tokio::test]
    async fn test_put_keeps_known_hashes() {
        let store = MemoryStore::new();
        store.put_dependencies("p1", vec![candidate("a", "1")]).await;
        store.record_hash("p1", "pkg:npm/a@1", &sha("aa")).await.unwrap();

        store
            .put_dependencies("p1", vec![candidate("a", "1"), candidate("b", "2")])
            .await;
        let hashed = store.hashed_purls("p1").await.unwrap();
        assert_eq!(hashed.len(), 1);
        assert_eq!(store.list_dependencies("p1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = MemoryStore::load(&path).unwrap();
        store.put_dependencies("p1", vec![candidate("a", "1")]).await;
        store.record_gap("p1", "pkg:npm/a@1", GapReason::FetchError).await.unwrap();
        store.save(&path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"gap\": \"fetch_error\""));

        let reloaded = MemoryStore::load(&path).unwrap();
        assert_eq!(reloaded.records("p1").await[0].gap, Some(GapReason::FetchError));
    }
}

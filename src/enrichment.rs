//! Hash enrichment worker.
//!
//! Back-fills artifact digests for a product's persisted dependencies. Every
//! input package ends up in exactly one bucket:
//!
//! `enriched + no_version + unsupported_ecosystem + not_found + fetch_error + already_enriched == total`
//!
//! Lookups within a batch run concurrently; results are written back one at
//! a time before the next batch starts.

use std::collections::HashSet;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EnrichmentConfig;
use crate::registry::{self, HashSource};
use crate::store::{DependencyStore, EnrichmentCandidate, GapReason};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GapBreakdown {
    pub no_version: usize,
    pub unsupported_ecosystem: usize,
    pub not_found: usize,
    pub fetch_error: usize,
}

impl GapBreakdown {
    fn count(&mut self, reason: GapReason) {
        match reason {
            GapReason::NoVersion => self.no_version += 1,
            GapReason::UnsupportedEcosystem => self.unsupported_ecosystem += 1,
            GapReason::NotFound => self.not_found += 1,
            GapReason::FetchError => self.fetch_error += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentResult {
    pub total: usize,
    pub enriched: usize,
    pub already_enriched: usize,
    /// `no_version + unsupported_ecosystem`
    pub skipped: usize,
    /// `not_found + fetch_error`
    pub failed: usize,
    pub gaps: GapBreakdown,
}

impl EnrichmentResult {
    fn record_gap(&mut self, reason: GapReason) {
        self.gaps.count(reason);
        match reason {
            GapReason::NoVersion | GapReason::UnsupportedEcosystem => self.skipped += 1,
            GapReason::NotFound | GapReason::FetchError => self.failed += 1,
        }
    }

    /// Whether every input package was accounted for.
    pub fn is_exhaustive(&self) -> bool {
        let g = &self.gaps;
        self.enriched + g.no_version + g.unsupported_ecosystem + g.not_found + g.fetch_error + self.already_enriched
            == self.total
    }
}

/// Enrich every dependency the store holds for `product_id`.
pub async fn enrich_product(
    store: &dyn DependencyStore,
    source: &dyn HashSource,
    product_id: &str,
    config: &EnrichmentConfig,
) -> EnrichmentResult {
    match store.list_dependencies(product_id).await {
        Ok(candidates) => enrich_dependencies(store, source, product_id, candidates, config).await,
        Err(e) => {
            warn!(product = product_id, error = %e, "could not list dependencies for enrichment");
            EnrichmentResult::default()
        }
    }
}

/// Enrich `candidates`, persisting hashes and gap reasons through `store`.
/// Never fails; store and registry errors are logged and counted.
pub async fn enrich_dependencies(
    store: &dyn DependencyStore,
    source: &dyn HashSource,
    product_id: &str,
    candidates: Vec<EnrichmentCandidate>,
    config: &EnrichmentConfig,
) -> EnrichmentResult {
    let mut result = EnrichmentResult {
        total: candidates.len(),
        ..EnrichmentResult::default()
    };

    let hashed: HashSet<String> = match store.hashed_purls(product_id).await {
        Ok(hashed) => hashed,
        Err(e) => {
            warn!(product = product_id, error = %e, "could not read existing hashes, re-enriching all");
            HashSet::new()
        }
    };

    let mut pending = Vec::new();
    for candidate in candidates {
        if hashed.contains(&candidate.purl) {
            result.already_enriched += 1;
            continue;
        }
        let gap = if candidate.version.trim().is_empty() {
            Some(GapReason::NoVersion)
        } else if !registry::is_supported(&candidate.ecosystem) {
            Some(GapReason::UnsupportedEcosystem)
        } else {
            None
        };
        match gap {
            Some(reason) => {
                debug!(purl = %candidate.purl, %reason, "not looked up");
                persist_gap(store, product_id, &candidate.purl, reason).await;
                result.record_gap(reason);
            }
            None => pending.push(candidate),
        }
    }

    let batches: Vec<&[EnrichmentCandidate]> = pending.chunks(config.batch_size.max(1)).collect();
    for (i, batch) in batches.iter().enumerate() {
        let lookups = join_all(batch.iter().map(|c| source.lookup(c))).await;

        for (candidate, lookup) in batch.iter().zip(lookups) {
            let reason = match lookup {
                Ok(Some(hash)) => match store.record_hash(product_id, &candidate.purl, &hash).await {
                    Ok(()) => {
                        result.enriched += 1;
                        continue;
                    }
                    Err(e) => {
                        warn!(purl = %candidate.purl, error = %e, "failed to store hash");
                        GapReason::FetchError
                    }
                },
                Ok(None) => GapReason::NotFound,
                Err(e) => {
                    warn!(purl = %candidate.purl, error = %e, "hash lookup failed");
                    GapReason::FetchError
                }
            };
            persist_gap(store, product_id, &candidate.purl, reason).await;
            result.record_gap(reason);
        }

        if i + 1 < batches.len() && config.batch_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.batch_delay_ms)).await;
        }
    }

    info!(
        product = product_id,
        total = result.total,
        enriched = result.enriched,
        already_enriched = result.already_enriched,
        skipped = result.skipped,
        failed = result.failed,
        "hash enrichment finished"
    );
    result
}

async fn persist_gap(store: &dyn DependencyStore, product_id: &str, purl: &str, reason: GapReason) {
    if let Err(e) = store.record_gap(product_id, purl, reason).await {
        warn!(purl, %reason, error = %e, "failed to store gap reason");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::{Result, ScanError};
    use crate::store::{MemoryStore, PackageHash};

    /// Answers from the package name: `missing-*` is not found, `broken-*`
    /// fails, anything else gets a hash.
    #[derive(Default)]
    struct FakeSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HashSource for FakeSource {
        async fn lookup(&self, candidate: &EnrichmentCandidate) -> Result<Option<PackageHash>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if candidate.name.starts_with("missing") {
                return Ok(None);
            }
            if candidate.name.starts_with("broken") {
                return Err(ScanError::RegistryStatus {
                    registry: "npm".to_string(),
                    status: 503,
                });
            }
            Ok(Some(PackageHash {
                algorithm: "sha256".to_string(),
                value: "00".repeat(32),
                source: candidate.ecosystem.clone(),
            }))
        }
    }

    fn candidate(name: &str, version: &str, ecosystem: &str) -> EnrichmentCandidate {
        EnrichmentCandidate {
            name: name.to_string(),
            version: version.to_string(),
            ecosystem: ecosystem.to_string(),
            purl: format!("pkg:{}/{}@{}", ecosystem.to_lowercase(), name, version),
        }
    }

    fn fast() -> EnrichmentConfig {
        EnrichmentConfig {
            batch_delay_ms: 0,
            ..EnrichmentConfig::default()
        }
    }

    #[tokio::test]
    async fn test_empty_version_makes_no_call() {
        let store = MemoryStore::new();
        let deps = vec![candidate("left-pad", "", "npm")];
        store.put_dependencies("p1", deps.clone()).await;
        let source = FakeSource::default();

        let result = enrich_dependencies(&store, &source, "p1", deps, &fast()).await;
        assert_eq!(result.gaps.no_version, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.records("p1").await[0].gap, Some(GapReason::NoVersion));
    }

    #[tokio::test]
    async fn test_every_package_lands_in_one_bucket() {
        let store = MemoryStore::new();
        let deps = vec![
            candidate("lodash", "4.17.21", "npm"),
            candidate("requests", "2.31.0", "PyPI"),
            candidate("flask", "3.0.0", "pip"),
            candidate("serde", "1.0.0", "cargo"),
            candidate("nover", " ", "npm"),
            candidate("missing-pkg", "1.0.0", "npm"),
            candidate("broken-pkg", "1.0.0", "npm"),
            candidate("cached", "1.0.0", "npm"),
        ];
        store.put_dependencies("p1", deps.clone()).await;
        store
            .record_hash(
                "p1",
                "pkg:npm/cached@1.0.0",
                &PackageHash {
                    algorithm: "sha1".to_string(),
                    value: "ab".to_string(),
                    source: "npm".to_string(),
                },
            )
            .await
            .unwrap();
        let source = FakeSource::default();

        let result = enrich_dependencies(&store, &source, "p1", deps, &fast()).await;
        assert_eq!(result.total, 8);
        assert_eq!(result.enriched, 3);
        assert_eq!(result.already_enriched, 1);
        assert_eq!(
            result.gaps,
            GapBreakdown {
                no_version: 1,
                unsupported_ecosystem: 1,
                not_found: 1,
                fetch_error: 1,
            }
        );
        assert_eq!(result.skipped, 2);
        assert_eq!(result.failed, 2);
        assert!(result.is_exhaustive());
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);

        let records = store.records("p1").await;
        let broken = records.iter().find(|r| r.dependency.name == "broken-pkg").unwrap();
        assert_eq!(broken.gap, Some(GapReason::FetchError));
        let flask = records.iter().find(|r| r.dependency.name == "flask").unwrap();
        assert!(flask.hash.is_some());
        assert_eq!(flask.gap, None);
    }

    #[tokio::test]
    async fn test_rerun_skips_enriched_and_clears_gaps() {
        let store = MemoryStore::new();
        store
            .put_dependencies("p1", vec![candidate("a", "1.0.0", "npm"), candidate("missing-b", "1.0.0", "npm")])
            .await;
        let source = FakeSource::default();

        let first = enrich_product(&store, &source, "p1", &fast()).await;
        assert_eq!(first.enriched, 1);
        assert_eq!(first.gaps.not_found, 1);

        let second = enrich_product(&store, &source, "p1", &fast()).await;
        assert_eq!(second.already_enriched, 1);
        assert_eq!(second.gaps.not_found, 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_batches_cover_everything() {
        let store = MemoryStore::new();
        let deps: Vec<EnrichmentCandidate> = (0..23)
            .map(|i| candidate(&format!("pkg{}", i), "1.0.0", "npm"))
            .collect();
        store.put_dependencies("p1", deps.clone()).await;
        let source = FakeSource::default();
        let config = EnrichmentConfig {
            batch_size: 10,
            batch_delay_ms: 1,
            ..EnrichmentConfig::default()
        };

        let result = enrich_dependencies(&store, &source, "p1", deps, &config).await;
        assert_eq!(result.enriched, 23);
        assert_eq!(source.calls.load(Ordering::SeqCst), 23);
        assert!(result.is_exhaustive());
    }

    #[tokio::test]
    async fn test_store_write_failure_counts_as_fetch_error() {
        // product never registered, so every write fails
        let store = MemoryStore::new();
        let source = FakeSource::default();
        let deps = vec![candidate("a", "1.0.0", "npm")];

        let result = enrich_dependencies(&store, &source, "ghost", deps, &fast()).await;
        assert_eq!(result.gaps.fetch_error, 1);
        assert!(result.is_exhaustive());
    }

    #[tokio::test]
    async fn test_unknown_product_is_empty() {
        let store = MemoryStore::new();
        let result = enrich_product(&store, &FakeSource::default(), "nope", &fast()).await;
        assert_eq!(result, EnrichmentResult::default());
        assert!(result.is_exhaustive());
    }
}

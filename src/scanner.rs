//! Tier 3: dependency inference from import statements.
//!
//! # Flow
//!
//! 1. List every path in the repository
//! 2. Keep paths claimed by a plugin extension, capped at `max_source_files`
//! 3. Fetch in concurrent batches under a byte budget and a global deadline
//! 4. Pick the best plugin per file; files under the confidence gate are ignored
//! 5. Extract imports, deduplicated by `(plugin, module)`
//! 6. Drop standard-library modules, map the rest to packages, dedupe by purl
//!
//! The deadline and the caller's cancellation token degrade the scan rather
//! than fail it: whatever was fetched before either tripped is still analysed.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, ScanConfig};
use crate::error::Result;
use crate::models::{Confidence, DetectedPackage, Ecosystem};
use crate::plugins::{self, LanguagePlugin};
use crate::provider::{RepoProvider, RepoRef};
use crate::spdx::{self, Component, Generator, SpdxDocument};

/// Upper bound on `go.mod` files read to learn the repository's own modules.
const MAX_GO_MODS: usize = 16;

/// Package count from which an import scan is reported with medium confidence.
pub const MEDIUM_CONFIDENCE_PACKAGES: usize = 5;

/// Counters describing what happened to each candidate file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Paths matching a plugin extension, before the cap.
    pub source_files: usize,
    pub files_over_cap: usize,
    pub fetched: usize,
    pub skipped_oversize: usize,
    pub skipped_budget: usize,
    pub fetch_failed: usize,
    pub missing: usize,
    pub bytes_fetched: usize,
    /// The deadline or the cancellation token stopped fetching early.
    pub timed_out: bool,
    /// Files per language, counting only files that passed the confidence gate.
    pub language_breakdown: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct ImportScanSbom {
    pub document: SpdxDocument,
    pub packages: Vec<DetectedPackage>,
    pub languages: Vec<String>,
    pub confidence: Confidence,
    pub stats: ScanStats,
}

/// Run Tier 3. `Ok(None)` when no source file or no package was found.
pub async fn generate_sbom_from_imports(
    provider: &dyn RepoProvider,
    repo: &RepoRef,
    config: &Config,
    cancel: Option<&CancellationToken>,
) -> Result<Option<ImportScanSbom>> {
    let scan = &config.scan;
    let paths = provider.list_repo_files(repo).await?;

    let mut sources: Vec<String> = paths.iter().filter(|p| plugins::is_source_file(p)).cloned().collect();
    if sources.is_empty() {
        debug!(owner = %repo.owner, repo = %repo.repo, "no source files for any plugin");
        return Ok(None);
    }
    let go_modules = own_go_modules(provider, repo, &paths).await;

    let mut stats = ScanStats {
        source_files: sources.len(),
        ..ScanStats::default()
    };
    if sources.len() > scan.max_source_files {
        stats.files_over_cap = sources.len() - scan.max_source_files;
        sources.truncate(scan.max_source_files);
    }

    let cancel = cancel.cloned().unwrap_or_default();
    let mut files = fetch_sources(provider, repo, &sources, scan, &cancel, &mut stats).await;
    // fetch completion order is arbitrary
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let own = OwnModules {
        go_modules,
        repo_suffix: format!("/{}/{}", repo.owner, repo.repo).to_lowercase(),
    };
    let packages = analyze(&files, scan.min_language_confidence, &own, &mut stats);
    if packages.is_empty() {
        info!(
            files = stats.fetched,
            languages = stats.language_breakdown.len(),
            "import scan found no third-party packages"
        );
        return Ok(None);
    }

    let languages: Vec<String> = stats.language_breakdown.keys().cloned().collect();
    let confidence = confidence_for(packages.len());
    let components: Vec<Component> = packages.iter().map(Component::from).collect();
    let document = spdx::build_document(repo, &components, Generator::ImportScan(&languages), &config.spdx);

    info!(
        packages = packages.len(),
        languages = ?languages,
        confidence = %confidence,
        timed_out = stats.timed_out,
        "import scan produced an SBOM"
    );
    Ok(Some(ImportScanSbom {
        document,
        packages,
        languages,
        confidence,
        stats,
    }))
}

/// The language count alone never promotes a scan: several languages with
/// fewer than five packages stay `low`. `high` is reserved for lockfile data.
fn confidence_for(packages: usize) -> Confidence {
    if packages >= MEDIUM_CONFIDENCE_PACKAGES {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// The repository's own code, which must never be reported as a dependency.
struct OwnModules {
    /// `module` directives of the repository's `go.mod` files.
    go_modules: Vec<String>,
    /// `/<owner>/<repo>`, lowercase. Catches Go imports of the repository
    /// itself when no `go.mod` was readable.
    repo_suffix: String,
}

impl OwnModules {
    fn contains(&self, plugin: &dyn LanguagePlugin, module: &str, package: &DetectedPackage) -> bool {
        if plugin.id() != "go" || package.ecosystem != Ecosystem::Golang {
            return false;
        }
        self.go_modules.iter().any(|m| plugins::under(module, m, '/'))
            || (self.repo_suffix.len() > 2 && package.name.to_lowercase().ends_with(&self.repo_suffix))
    }
}

async fn own_go_modules(provider: &dyn RepoProvider, repo: &RepoRef, paths: &[String]) -> Vec<String> {
    let mut modules = Vec::new();
    let go_mods = paths
        .iter()
        .filter(|p| *p == "go.mod" || p.ends_with("/go.mod"))
        .take(MAX_GO_MODS);
    for path in go_mods {
        match provider.get_file_content(repo, path).await {
            Ok(Some(content)) => {
                if let Some(module) = plugins::go::module_directive(&content) {
                    debug!(path = %path, module = %module, "repository go module");
                    modules.push(module);
                }
            }
            Ok(None) => {}
            Err(e) => debug!(path = %path, error = %e, "could not read go.mod"),
        }
    }
    modules
}

async fn fetch_sources(
    provider: &dyn RepoProvider,
    repo: &RepoRef,
    paths: &[String],
    scan: &ScanConfig,
    cancel: &CancellationToken,
    stats: &mut ScanStats,
) -> Vec<(String, String)> {
    let deadline = tokio::time::sleep(Duration::from_secs(scan.timeout_secs));
    tokio::pin!(deadline);

    let mut files = Vec::new();
    let mut budget_exhausted = false;

    'batches: for batch in paths.chunks(scan.fetch_batch_size.max(1)) {
        if budget_exhausted {
            stats.skipped_budget += batch.len();
            continue;
        }

        let mut in_flight: FuturesUnordered<_> = batch
            .iter()
            .map(|path| async move { (path, provider.get_file_content(repo, path).await) })
            .collect();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(fetched = stats.fetched, "import scan cancelled, analysing partial results");
                    stats.timed_out = true;
                    break 'batches;
                }
                _ = &mut deadline => {
                    warn!(
                        timeout_secs = scan.timeout_secs,
                        fetched = stats.fetched,
                        "import scan deadline reached, analysing partial results"
                    );
                    stats.timed_out = true;
                    break 'batches;
                }
                next = in_flight.next() => {
                    let Some((path, result)) = next else {
                        break;
                    };
                    match result {
                        Ok(Some(content)) if content.len() > scan.max_file_bytes => {
                            debug!(path = %path, size = content.len(), "skipping oversized file");
                            stats.skipped_oversize += 1;
                        }
                        Ok(Some(content)) => {
                            if budget_exhausted || stats.bytes_fetched + content.len() > scan.max_total_bytes {
                                budget_exhausted = true;
                                stats.skipped_budget += 1;
                                continue;
                            }
                            stats.bytes_fetched += content.len();
                            stats.fetched += 1;
                            files.push((path.clone(), content));
                        }
                        Ok(None) => stats.missing += 1,
                        Err(e) => {
                            warn!(path = %path, error = %e, "source fetch failed");
                            stats.fetch_failed += 1;
                        }
                    }
                }
            }
        }
    }

    files
}

/// Language attribution and import mapping over the fetched files.
fn analyze(
    files: &[(String, String)],
    min_confidence: u8,
    own: &OwnModules,
    stats: &mut ScanStats,
) -> Vec<DetectedPackage> {
    let mut seen_imports: HashSet<(&'static str, String)> = HashSet::new();
    let mut imports: Vec<(&'static dyn LanguagePlugin, String)> = Vec::new();

    for (path, content) in files {
        let Some((plugin, confidence)) = plugins::select_plugin(path, content) else {
            continue;
        };
        if confidence < min_confidence {
            debug!(path = %path, best = plugin.id(), confidence, "no language above the confidence gate");
            continue;
        }
        *stats.language_breakdown.entry(plugin.id().to_string()).or_default() += 1;

        for entry in plugin.extract_imports(content) {
            if seen_imports.insert((plugin.id(), entry.module.clone())) {
                imports.push((plugin, entry.module));
            }
        }
    }

    let mut seen_purls: HashSet<String> = HashSet::new();
    let mut packages = Vec::new();
    for (plugin, module) in imports {
        if plugin.is_std_lib(&module) {
            continue;
        }
        let Some(package) = plugin.map_to_package(&module) else {
            continue;
        };
        if own.contains(plugin, &module, &package) {
            debug!(module = %module, "skipping the repository's own module");
            continue;
        }
        if seen_purls.insert(package.purl.clone()) {
            packages.push(package);
        }
    }
    packages
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::error::ScanError;
    use crate::provider::MemoryProvider;

    fn repo() -> RepoRef {
        RepoRef::local("acme", "widgets", "https://example.com/acme/widgets")
    }

    async fn scan(provider: &dyn RepoProvider, config: &Config) -> Option<ImportScanSbom> {
        generate_sbom_from_imports(provider, &repo(), config, None).await.unwrap()
    }

    #[tokio::test]
    async fn test_python_requests_and_os() {
        let provider = MemoryProvider::new()
            .with_file("app/main.py", "import os\nimport requests\n\n\ndef main():\n    return requests.get('https://example.com')\n")
            .with_file("README.md", "# widgets\n");

        let sbom = scan(&provider, &Config::default()).await.unwrap();
        assert_eq!(sbom.languages, vec!["python"]);
        assert_eq!(sbom.packages.len(), 1);
        assert_eq!(sbom.packages[0].name, "requests");
        assert_eq!(sbom.confidence, Confidence::Low);
        assert_eq!(sbom.document.packages.len(), 2);
        assert_eq!(sbom.stats.source_files, 1);
        assert_eq!(
            sbom.document.creation_info.creators[1],
            "Tool: import-scanner (python)"
        );
    }

    #[tokio::test]
    async fn test_multi_language_medium_confidence() {
        let provider = MemoryProvider::new()
            .with_file(
                "web/index.js",
                "import express from 'express';\nimport lodash from 'lodash';\nconst axios = require('axios');\n",
            )
            .with_file(
                "cmd/server/main.go",
                "package main\n\nimport (\n\t\"fmt\"\n\t\"github.com/spf13/cobra\"\n\t\"github.com/pkg/errors\"\n\t\"golang.org/x/sync/errgroup\"\n)\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}\n",
            );

        let sbom = scan(&provider, &Config::default()).await.unwrap();
        assert_eq!(sbom.packages.len(), 6);
        assert_eq!(sbom.languages.len(), 2);
        assert_eq!(sbom.confidence, Confidence::Medium);
    }

    #[tokio::test]
    async fn test_no_source_files_is_none() {
        let provider = MemoryProvider::new()
            .with_file("README.md", "# docs\n")
            .with_file("LICENSE", "MIT\n");
        assert!(scan(&provider, &Config::default()).await.is_none());
    }

    #[tokio::test]
    async fn test_only_stdlib_is_none() {
        let provider = MemoryProvider::new().with_file("tool.py", "import os\nimport sys\nimport json\n");
        assert!(scan(&provider, &Config::default()).await.is_none());
    }

    #[tokio::test]
    async fn test_same_package_across_files_is_deduplicated() {
        let provider = MemoryProvider::new()
            .with_file("a.py", "import requests\n")
            .with_file("b.py", "from requests import Session\nimport requests.adapters\n")
            .with_file("c.py", "import yaml\n");

        let sbom = scan(&provider, &Config::default()).await.unwrap();
        let purls: Vec<&str> = sbom.packages.iter().map(|p| p.purl.as_str()).collect();
        assert_eq!(purls.len(), 2);
        let unique: HashSet<&str> = purls.iter().copied().collect();
        assert_eq!(unique.len(), 2);
    }

    #[tokio::test]
    async fn test_no_package_from_stdlib_module() {
        let provider = MemoryProvider::new()
            .with_file("a.py", "import os\nimport json\nimport flask\n")
            .with_file("b.rb", "require 'json'\nrequire 'set'\nrequire 'rails'\n");

        let sbom = scan(&provider, &Config::default()).await.unwrap();
        for pkg in &sbom.packages {
            assert!(!["os", "json", "set"].contains(&pkg.name.as_str()), "{}", pkg.name);
        }
        assert_eq!(sbom.packages.len(), 2);
    }

    #[tokio::test]
    async fn test_file_cap_and_size_limits() {
        let mut config = Config::default();
        config.scan.max_source_files = 2;
        config.scan.max_file_bytes = 64;

        let provider = MemoryProvider::new()
            .with_file("a.py", "import requests\n")
            .with_file("b.py", format!("import flask\n# {}\n", "x".repeat(100)))
            .with_file("c.py", "import numpy\n");

        let sbom = scan(&provider, &config).await.unwrap();
        assert_eq!(sbom.stats.source_files, 3);
        assert_eq!(sbom.stats.files_over_cap, 1);
        assert_eq!(sbom.stats.skipped_oversize, 1);
        assert_eq!(sbom.stats.fetched, 1);
        assert_eq!(sbom.packages[0].name, "requests");
    }

    #[tokio::test]
    async fn test_byte_budget_stops_fetching() {
        let mut config = Config::default();
        config.scan.fetch_batch_size = 1;
        config.scan.max_total_bytes = 20;

        let provider = MemoryProvider::new()
            .with_file("a.py", "import requests\n")
            .with_file("b.py", "import flask\n")
            .with_file("c.py", "import numpy\n");

        let sbom = scan(&provider, &config).await.unwrap();
        assert_eq!(sbom.stats.fetched, 1);
        assert_eq!(sbom.stats.skipped_budget, 2);
        assert_eq!(sbom.packages.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failures_and_missing_are_counted() {
        let provider = MemoryProvider::new()
            .with_file("a.py", "import requests\n")
            .fail_on("b.py");

        let sbom = scan(&provider, &Config::default()).await.unwrap();
        assert_eq!(sbom.stats.fetch_failed, 1);
        assert_eq!(sbom.stats.missing, 0);
        assert_eq!(sbom.packages.len(), 1);
    }

    #[tokio::test]
    async fn test_listed_but_absent_file_counts_as_missing() {
        let provider = MemoryProvider::new()
            .with_file("a.py", "import requests\n")
            .with_listed("deleted.py");

        let sbom = scan(&provider, &Config::default()).await.unwrap();
        assert_eq!(sbom.stats.missing, 1);
        assert_eq!(sbom.stats.fetch_failed, 0);
        assert_eq!(sbom.stats.fetched, 1);
        assert_eq!(sbom.packages.len(), 1);
    }

    #[tokio::test]
    async fn test_own_go_module_from_go_mod_is_not_a_dependency() {
        let provider = MemoryProvider::new()
            .with_file("go.mod", "module github.com/acme/shop\n\ngo 1.22\n")
            .with_file(
                "cmd/main.go",
                "package main\n\nimport (\n\t\"fmt\"\n\t\"github.com/acme/shop/internal/billing\"\n\t\"github.com/spf13/cobra\"\n)\n\nfunc main() {\n\tfmt.Println(billing.Total())\n}\n",
            );

        let sbom = scan(&provider, &Config::default()).await.unwrap();
        let purls: Vec<&str> = sbom.packages.iter().map(|p| p.purl.as_str()).collect();
        assert_eq!(purls, vec!["pkg:golang/github.com/spf13/cobra"]);
    }

    #[tokio::test]
    async fn test_own_go_module_from_repo_name_is_not_a_dependency() {
        let provider = MemoryProvider::new().with_file(
            "main.go",
            "package main\n\nimport (\n\t\"github.com/acme/shop/internal/billing\"\n\t\"github.com/pkg/errors\"\n)\n\nfunc main() {\n\tbilling.Run()\n}\n",
        );
        let repo = RepoRef::local("acme", "shop", "https://github.com/acme/shop");

        let sbom = generate_sbom_from_imports(&provider, &repo, &Config::default(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sbom.packages.len(), 1);
        assert_eq!(sbom.packages[0].name, "github.com/pkg/errors");
    }

    #[tokio::test]
    async fn test_listing_failure_is_an_error() {
        let provider = MemoryProvider::new().fail_listing();
        let result = generate_sbom_from_imports(&provider, &repo(), &Config::default(), None).await;
        assert!(matches!(result, Err(ScanError::Provider(_))));
    }

    /// Serves every file immediately except `stuck.py`, which never resolves.
    struct StuckProvider(MemoryProvider);

    #[async_trait]
    impl RepoProvider for StuckProvider {
        async fn list_repo_files(&self, repo: &RepoRef) -> Result<Vec<String>> {
            let mut files = self.0.list_repo_files(repo).await?;
            files.push("stuck.py".to_string());
            Ok(files)
        }

        async fn get_file_content(&self, repo: &RepoRef, path: &str) -> Result<Option<String>> {
            if path == "stuck.py" {
                std::future::pending::<()>().await;
            }
            self.0.get_file_content(repo, path).await
        }
    }

    #[tokio::test]
    async fn test_cancellation_keeps_fetched_files() {
        let provider = StuckProvider(MemoryProvider::new().with_file("a.py", "import requests\n"));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let sbom = generate_sbom_from_imports(&provider, &repo(), &Config::default(), Some(&cancel))
            .await
            .unwrap()
            .unwrap();
        assert!(sbom.stats.timed_out);
        assert_eq!(sbom.stats.fetched, 1);
        assert_eq!(sbom.packages[0].name, "requests");
    }

    #[tokio::test]
    async fn test_deadline_degrades_softly() {
        let mut config = Config::default();
        config.scan.timeout_secs = 1;
        let provider = StuckProvider(MemoryProvider::new().with_file("a.py", "import requests\n"));

        let sbom = generate_sbom_from_imports(&provider, &repo(), &config, None)
            .await
            .unwrap()
            .unwrap();
        assert!(sbom.stats.timed_out);
        assert_eq!(sbom.packages.len(), 1);
    }

    #[test]
    fn test_confidence_rules() {
        assert_eq!(confidence_for(1), Confidence::Low);
        assert_eq!(confidence_for(4), Confidence::Low);
        assert_eq!(confidence_for(5), Confidence::Medium);
        assert_eq!(confidence_for(60), Confidence::Medium);
    }
}

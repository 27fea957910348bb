//! Tier 2: dependency discovery from lockfiles and pinned manifests.
//!
//! Candidates are tried in [`LOCKFILES`] order at the repository root. The
//! first one that exists, fits under the size limit and parses to at least
//! one dependency wins; everything else falls through to the next candidate.

use std::collections::HashSet;

use anyhow::Result as ParseResult;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, ScanError};
use crate::models::{Ecosystem, ParsedDependency};
use crate::provider::{RepoProvider, RepoRef};
use crate::spdx::{self, Component, Generator, SpdxDocument};

pub mod dart;
pub mod dotnet;
pub mod elixir;
pub mod go;
pub mod java;
pub mod node;
pub mod php;
pub mod python;
pub mod ruby;
pub mod rust;
pub mod swift;

pub type ParseFn = fn(&str) -> ParseResult<Vec<ParsedDependency>>;

/// A lockfile name and the parser that understands it.
pub struct Lockfile {
    pub filename: &'static str,
    pub ecosystem: Ecosystem,
    parse: ParseFn,
}

impl Lockfile {
    pub fn parse(&self, content: &str) -> ParseResult<Vec<ParsedDependency>> {
        (self.parse)(content)
    }
}

/// Candidates in priority order.
pub static LOCKFILES: &[Lockfile] = &[
    Lockfile { filename: "package-lock.json", ecosystem: Ecosystem::Npm, parse: node::parse_package_lock },
    Lockfile { filename: "npm-shrinkwrap.json", ecosystem: Ecosystem::Npm, parse: node::parse_package_lock },
    Lockfile { filename: "yarn.lock", ecosystem: Ecosystem::Npm, parse: node::parse_yarn_lock },
    Lockfile { filename: "pnpm-lock.yaml", ecosystem: Ecosystem::Npm, parse: node::parse_pnpm_lock },
    Lockfile { filename: "Cargo.lock", ecosystem: Ecosystem::Cargo, parse: rust::parse_cargo_lock },
    Lockfile { filename: "poetry.lock", ecosystem: Ecosystem::Pypi, parse: python::parse_poetry_lock },
    Lockfile { filename: "uv.lock", ecosystem: Ecosystem::Pypi, parse: python::parse_uv_lock },
    Lockfile { filename: "Pipfile.lock", ecosystem: Ecosystem::Pypi, parse: python::parse_pipfile_lock },
    Lockfile { filename: "requirements.txt", ecosystem: Ecosystem::Pypi, parse: python::parse_requirements_txt },
    Lockfile { filename: "go.mod", ecosystem: Ecosystem::Golang, parse: go::parse_go_mod },
    Lockfile { filename: "Gemfile.lock", ecosystem: Ecosystem::Gem, parse: ruby::parse_gemfile_lock },
    Lockfile { filename: "composer.lock", ecosystem: Ecosystem::Composer, parse: php::parse_composer_lock },
    Lockfile { filename: "gradle.lockfile", ecosystem: Ecosystem::Maven, parse: java::parse_gradle_lockfile },
    Lockfile { filename: "packages.lock.json", ecosystem: Ecosystem::Nuget, parse: dotnet::parse_packages_lock },
    Lockfile { filename: "paket.lock", ecosystem: Ecosystem::Nuget, parse: dotnet::parse_paket_lock },
    Lockfile { filename: "pubspec.lock", ecosystem: Ecosystem::Pub, parse: dart::parse_pubspec_lock },
    Lockfile { filename: "mix.lock", ecosystem: Ecosystem::Hex, parse: elixir::parse_mix_lock },
    Lockfile { filename: "Package.resolved", ecosystem: Ecosystem::Swift, parse: swift::parse_package_resolved },
    Lockfile { filename: "pom.xml", ecosystem: Ecosystem::Maven, parse: java::parse_pom_xml },
];

/// Result of a successful Tier 2 run.
#[derive(Debug, Clone)]
pub struct LockfileSbom {
    pub document: SpdxDocument,
    pub lockfile_used: &'static str,
    pub total_dependencies: usize,
    pub dependencies: Vec<ParsedDependency>,
}

pub fn lockfile_by_name(filename: &str) -> Option<&'static Lockfile> {
    LOCKFILES.iter().find(|l| l.filename == filename)
}

/// Parse `content` as `filename`, deduplicating by purl.
pub fn parse_lockfile(filename: &str, content: &str) -> Result<Vec<ParsedDependency>> {
    let lockfile = lockfile_by_name(filename).ok_or_else(|| ScanError::LockfileParse {
        file: filename.to_string(),
        reason: "unsupported lockfile".to_string(),
    })?;
    let parsed = lockfile.parse(content).map_err(|e| ScanError::LockfileParse {
        file: filename.to_string(),
        reason: e.to_string(),
    })?;
    Ok(dedupe(parsed))
}

fn dedupe(deps: Vec<ParsedDependency>) -> Vec<ParsedDependency> {
    let mut seen: HashSet<String> = HashSet::new();
    deps.into_iter().filter(|d| seen.insert(d.purl.clone())).collect()
}

/// Run Tier 2 against the repository root.
///
/// `Ok(None)` means no candidate produced a dependency. Provider failures do
/// not stop the walk; the last one is returned only if no candidate succeeded
/// and at least one fetch failed.
pub async fn generate_sbom_from_lockfiles(
    provider: &dyn RepoProvider,
    repo: &RepoRef,
    config: &Config,
) -> Result<Option<LockfileSbom>> {
    let max = config.lockfile.max_lockfile_bytes;
    let mut provider_error: Option<ScanError> = None;

    for lockfile in LOCKFILES {
        let content = match provider.get_file_content(repo, lockfile.filename).await {
            Ok(Some(content)) => content,
            Ok(None) => continue,
            Err(e) => {
                warn!(file = lockfile.filename, error = %e, "lockfile fetch failed");
                provider_error = Some(e);
                continue;
            }
        };

        if content.len() > max {
            let err = ScanError::FileTooBig {
                path: lockfile.filename.to_string(),
                size: content.len(),
                max,
            };
            warn!("{}", err);
            continue;
        }

        let dependencies = match parse_lockfile(lockfile.filename, &content) {
            Ok(deps) if deps.is_empty() => {
                debug!(file = lockfile.filename, "lockfile has no dependencies");
                continue;
            }
            Ok(deps) => deps,
            Err(e) => {
                warn!(error = %e, "skipping unparseable lockfile");
                continue;
            }
        };

        let components: Vec<Component> = dependencies.iter().map(Component::from).collect();
        let document = spdx::build_document(
            repo,
            &components,
            Generator::Lockfile(lockfile.filename),
            &config.spdx,
        );
        info!(
            file = lockfile.filename,
            dependencies = dependencies.len(),
            "lockfile tier produced an SBOM"
        );
        return Ok(Some(LockfileSbom {
            document,
            lockfile_used: lockfile.filename,
            total_dependencies: dependencies.len(),
            dependencies,
        }));
    }

    match provider_error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

//! Tier selection: lockfiles first, then import scanning.
//!
//! A tier that errors is logged and treated like a tier that found nothing,
//! so [`generate_sbom`] always produces an outcome.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::lockfile::{self, LockfileSbom};
use crate::models::Confidence;
use crate::provider::{RepoProvider, RepoRef};
use crate::scanner::{self, ImportScanSbom};
use crate::spdx::SpdxDocument;
use crate::store::EnrichmentCandidate;

/// Which tiers [`generate_sbom`] may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TierSelection {
    #[default]
    Auto,
    Lockfile,
    Imports,
}

#[derive(Debug, Clone)]
pub enum SbomOutcome {
    Lockfile(LockfileSbom),
    Imports(ImportScanSbom),
    NoDependencies,
}

impl SbomOutcome {
    pub fn document(&self) -> Option<&SpdxDocument> {
        match self {
            SbomOutcome::Lockfile(sbom) => Some(&sbom.document),
            SbomOutcome::Imports(sbom) => Some(&sbom.document),
            SbomOutcome::NoDependencies => None,
        }
    }

    /// Lockfile results are treated as exact.
    pub fn confidence(&self) -> Option<Confidence> {
        match self {
            SbomOutcome::Lockfile(_) => Some(Confidence::High),
            SbomOutcome::Imports(sbom) => Some(sbom.confidence),
            SbomOutcome::NoDependencies => None,
        }
    }

    pub fn tier(&self) -> &'static str {
        match self {
            SbomOutcome::Lockfile(_) => "lockfile",
            SbomOutcome::Imports(_) => "imports",
            SbomOutcome::NoDependencies => "none",
        }
    }

    /// The discovered packages in the shape the enrichment worker consumes.
    /// Import-derived packages carry no version.
    pub fn enrichment_candidates(&self) -> Vec<EnrichmentCandidate> {
        match self {
            SbomOutcome::Lockfile(sbom) => {
                let ecosystem = lockfile::lockfile_by_name(sbom.lockfile_used)
                    .map(|l| l.ecosystem.purl_type())
                    .unwrap_or_default();
                sbom.dependencies
                    .iter()
                    .map(|d| EnrichmentCandidate {
                        name: d.name.clone(),
                        version: d.version.clone(),
                        ecosystem: ecosystem.to_string(),
                        purl: d.purl.clone(),
                    })
                    .collect()
            }
            SbomOutcome::Imports(sbom) => sbom
                .packages
                .iter()
                .map(|p| EnrichmentCandidate {
                    name: p.name.clone(),
                    version: p.version.clone().unwrap_or_default(),
                    ecosystem: p.ecosystem.purl_type().to_string(),
                    purl: p.purl.clone(),
                })
                .collect(),
            SbomOutcome::NoDependencies => Vec::new(),
        }
    }
}

pub async fn generate_sbom(
    provider: &dyn RepoProvider,
    repo: &RepoRef,
    config: &Config,
    tiers: TierSelection,
    cancel: Option<&CancellationToken>,
) -> SbomOutcome {
    if tiers != TierSelection::Imports {
        match lockfile::generate_sbom_from_lockfiles(provider, repo, config).await {
            Ok(Some(sbom)) => return SbomOutcome::Lockfile(sbom),
            Ok(None) => info!(owner = %repo.owner, repo = %repo.repo, "no usable lockfile"),
            Err(e) => warn!(owner = %repo.owner, repo = %repo.repo, error = %e, "lockfile tier failed"),
        }
    }

    if tiers != TierSelection::Lockfile {
        match scanner::generate_sbom_from_imports(provider, repo, config, cancel).await {
            Ok(Some(sbom)) => return SbomOutcome::Imports(sbom),
            Ok(None) => info!(owner = %repo.owner, repo = %repo.repo, "import scan found no dependencies"),
            Err(e) => warn!(owner = %repo.owner, repo = %repo.repo, error = %e, "import tier failed"),
        }
    }

    SbomOutcome::NoDependencies
}

//! Report renderers for SBOM and enrichment results.
//!
//! - [`terminal`]: colored, tabular output with a summary box; respects `--quiet`.
//! - [`SbomSummary`]: the machine-readable form behind `--report json`.

pub mod terminal;

use serde::Serialize;

use crate::models::Confidence;
use crate::pipeline::SbomOutcome;
use crate::provider::RepoRef;
use crate::scanner::ScanStats;

/// One row of the dependency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRow {
    pub name: String,
    pub version: Option<String>,
    pub purl: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SbomSummary {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// `lockfile`, `imports` or `none`.
    pub tier: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lockfile_used: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_stats: Option<ScanStats>,
    pub packages: Vec<PackageRow>,
}

impl SbomSummary {
    pub fn new(repo: &RepoRef, outcome: &SbomOutcome) -> Self {
        let mut summary = Self {
            owner: repo.owner.clone(),
            repo: repo.repo.clone(),
            branch: repo.branch.clone(),
            tier: outcome.tier(),
            lockfile_used: None,
            languages: Vec::new(),
            confidence: outcome.confidence(),
            document_namespace: outcome.document().map(|d| d.document_namespace.clone()),
            scan_stats: None,
            packages: Vec::new(),
        };
        match outcome {
            SbomOutcome::Lockfile(sbom) => {
                summary.lockfile_used = Some(sbom.lockfile_used);
                summary.packages = sbom
                    .dependencies
                    .iter()
                    .map(|d| PackageRow {
                        name: d.name.clone(),
                        version: Some(d.version.clone()),
                        purl: d.purl.clone(),
                    })
                    .collect();
            }
            SbomOutcome::Imports(sbom) => {
                summary.languages = sbom.languages.clone();
                summary.scan_stats = Some(sbom.stats.clone());
                summary.packages = sbom
                    .packages
                    .iter()
                    .map(|p| PackageRow {
                        name: p.name.clone(),
                        version: p.version.clone(),
                        purl: p.purl.clone(),
                    })
                    .collect();
            }
            SbomOutcome::NoDependencies => {}
        }
        summary
    }
}

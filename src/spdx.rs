//! SPDX 2.3 JSON document assembly, shared by the lockfile and import tiers.
//!
//! Layout of every generated document:
//!
//! - one root package `SPDXRef-Package-root` describing the repository,
//! - one package per unique purl, each with a single `purl` external ref,
//! - `SPDXRef-DOCUMENT DESCRIBES SPDXRef-Package-root`,
//! - `SPDXRef-Package-root DEPENDS_ON <package>` for every dependency.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::SpdxConfig;
use crate::models::{DetectedPackage, ParsedDependency};
use crate::provider::RepoRef;

pub const DOCUMENT_ID: &str = "SPDXRef-DOCUMENT";
pub const ROOT_ID: &str = "SPDXRef-Package-root";
const NOASSERTION: &str = "NOASSERTION";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxDocument {
    pub spdx_version: String,
    pub data_license: String,
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    pub name: String,
    pub document_namespace: String,
    pub creation_info: CreationInfo,
    pub packages: Vec<SpdxPackage>,
    pub relationships: Vec<SpdxRelationship>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationInfo {
    pub creators: Vec<String>,
    pub created: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_info: Option<String>,
    pub download_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    pub files_analyzed: bool,
    pub license_concluded: String,
    pub license_declared: String,
    pub copyright_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_refs: Vec<ExternalRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRef {
    pub reference_category: String,
    pub reference_type: String,
    pub reference_locator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxRelationship {
    pub spdx_element_id: String,
    pub relationship_type: String,
    pub related_spdx_element: String,
}

impl SpdxRelationship {
    fn new(from: &str, kind: &str, to: &str) -> Self {
        Self {
            spdx_element_id: from.to_string(),
            relationship_type: kind.to_string(),
            related_spdx_element: to.to_string(),
        }
    }
}

/// A dependency as the assembler sees it, whichever tier produced it.
#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub version: Option<String>,
    pub purl: String,
}

impl From<&ParsedDependency> for Component {
    fn from(dep: &ParsedDependency) -> Self {
        Self {
            name: dep.name.clone(),
            version: Some(dep.version.clone()).filter(|v| !v.is_empty()),
            purl: dep.purl.clone(),
        }
    }
}

impl From<&DetectedPackage> for Component {
    fn from(pkg: &DetectedPackage) -> Self {
        Self {
            name: pkg.name.clone(),
            version: pkg.version.clone(),
            purl: pkg.purl.clone(),
        }
    }
}

/// Which tier produced the dependency set; recorded in `creationInfo.creators`.
#[derive(Debug, Clone, Copy)]
pub enum Generator<'a> {
    Lockfile(&'a str),
    ImportScan(&'a [String]),
}

impl Generator<'_> {
    fn creator(&self) -> String {
        match self {
            Generator::Lockfile(file) => format!("Tool: lockfile-parser ({})", file),
            Generator::ImportScan(languages) => {
                format!("Tool: import-scanner ({})", languages.join(", "))
            }
        }
    }
}

/// Build the document. Components sharing a purl are collapsed into the
/// first occurrence.
pub fn build_document(
    repo: &RepoRef,
    components: &[Component],
    generator: Generator<'_>,
    config: &SpdxConfig,
) -> SpdxDocument {
    let now = Utc::now();
    let namespace = format!(
        "{}/{}/{}-{}-{}",
        config.namespace_base.trim_end_matches('/'),
        repo.owner,
        repo.repo,
        now.format("%Y%m%dT%H%M%SZ"),
        uuid::Uuid::new_v4()
    );

    let mut packages = vec![root_package(repo)];
    let mut relationships = vec![SpdxRelationship::new(DOCUMENT_ID, "DESCRIBES", ROOT_ID)];

    let mut seen: HashSet<&str> = HashSet::new();
    for component in components {
        if !seen.insert(component.purl.as_str()) {
            continue;
        }
        let spdx_id = format!("SPDXRef-Package-{}-{}", seen.len(), sanitize(&component.name));
        relationships.push(SpdxRelationship::new(ROOT_ID, "DEPENDS_ON", &spdx_id));
        packages.push(SpdxPackage {
            spdx_id,
            name: component.name.clone(),
            version_info: component.version.clone(),
            download_location: NOASSERTION.to_string(),
            supplier: None,
            files_analyzed: false,
            license_concluded: NOASSERTION.to_string(),
            license_declared: NOASSERTION.to_string(),
            copyright_text: NOASSERTION.to_string(),
            external_refs: vec![ExternalRef {
                reference_category: "PACKAGE-MANAGER".to_string(),
                reference_type: "purl".to_string(),
                reference_locator: component.purl.clone(),
            }],
        });
    }

    SpdxDocument {
        spdx_version: "SPDX-2.3".to_string(),
        data_license: "CC0-1.0".to_string(),
        spdx_id: DOCUMENT_ID.to_string(),
        name: format!("{}/{}", repo.owner, repo.repo),
        document_namespace: namespace,
        creation_info: CreationInfo {
            creators: vec![
                format!("Tool: {}-{}", config.tool_name, env!("CARGO_PKG_VERSION")),
                generator.creator(),
            ],
            created: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        },
        packages,
        relationships,
    }
}

fn root_package(repo: &RepoRef) -> SpdxPackage {
    SpdxPackage {
        spdx_id: ROOT_ID.to_string(),
        name: repo.repo.clone(),
        version_info: Some(repo.branch.clone()).filter(|b| !b.is_empty()),
        download_location: if repo.url.is_empty() {
            NOASSERTION.to_string()
        } else {
            repo.url.clone()
        },
        supplier: Some(format!("Organization: {}", repo.owner)),
        files_analyzed: false,
        license_concluded: NOASSERTION.to_string(),
        license_declared: NOASSERTION.to_string(),
        copyright_text: NOASSERTION.to_string(),
        external_refs: Vec::new(),
    }
}

/// SPDX identifiers allow only letters, digits, `.` and `-`.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ecosystem;

    fn repo() -> RepoRef {
        RepoRef::local("acme", "widgets", "https://example.com/acme/widgets")
    }

    fn components() -> Vec<Component> {
        [
            ParsedDependency::new(Ecosystem::Npm, "@types/node", "20.1.0"),
            ParsedDependency::new(Ecosystem::Npm, "lodash", "4.17.21"),
            ParsedDependency::new(Ecosystem::Npm, "lodash", "4.17.21"),
        ]
        .iter()
        .map(Component::from)
        .collect()
    }

    #[test]
    fn test_root_and_relationships() {
        let doc = build_document(&repo(), &components(), Generator::Lockfile("package-lock.json"), &SpdxConfig::default());

        assert_eq!(doc.packages.len(), 3);
        assert_eq!(doc.packages[0].spdx_id, ROOT_ID);
        assert_eq!(doc.packages[0].supplier.as_deref(), Some("Organization: acme"));
        assert_eq!(doc.packages[0].download_location, "https://example.com/acme/widgets");

        let describes: Vec<_> = doc
            .relationships
            .iter()
            .filter(|r| r.relationship_type == "DESCRIBES")
            .collect();
        assert_eq!(describes.len(), 1);
        assert_eq!(describes[0].spdx_element_id, DOCUMENT_ID);
        assert_eq!(describes[0].related_spdx_element, ROOT_ID);

        let depends: Vec<_> = doc
            .relationships
            .iter()
            .filter(|r| r.relationship_type == "DEPENDS_ON")
            .collect();
        assert_eq!(depends.len(), 2);
        assert!(depends.iter().all(|r| r.spdx_element_id == ROOT_ID));
    }

    #[test]
    fn test_package_ids_are_valid_and_unique() {
        let doc = build_document(&repo(), &components(), Generator::Lockfile("package-lock.json"), &SpdxConfig::default());
        assert_eq!(doc.packages[1].spdx_id, "SPDXRef-Package-1--types-node");
        assert_eq!(doc.packages[2].spdx_id, "SPDXRef-Package-2-lodash");
        assert_eq!(doc.packages[2].external_refs[0].reference_locator, "pkg:npm/lodash@4.17.21");
    }

    #[test]
    fn test_creation_info() {
        let languages = vec!["python".to_string(), "go".to_string()];
        let doc = build_document(&repo(), &[], Generator::ImportScan(&languages), &SpdxConfig::default());

        assert_eq!(doc.creation_info.creators.len(), 2);
        assert!(doc.creation_info.creators[0].starts_with("Tool: repo-sbom-"));
        assert_eq!(doc.creation_info.creators[1], "Tool: import-scanner (python, go)");
        assert!(chrono::NaiveDateTime::parse_from_str(&doc.creation_info.created, "%Y-%m-%dT%H:%M:%SZ").is_ok());
    }

    #[test]
    fn test_unique_namespace() {
        let config = SpdxConfig::default();
        let a = build_document(&repo(), &[], Generator::Lockfile("go.mod"), &config);
        let b = build_document(&repo(), &[], Generator::Lockfile("go.mod"), &config);
        assert_ne!(a.document_namespace, b.document_namespace);
        assert!(a
            .document_namespace
            .starts_with("https://spdx.org/spdxdocs/repo-sbom/acme/widgets-"));
    }

    #[test]
    fn test_serialized_field_names() {
        let doc = build_document(&repo(), &components(), Generator::Lockfile("package-lock.json"), &SpdxConfig::default());
        let json: serde_json::Value = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["spdxVersion"], "SPDX-2.3");
        assert_eq!(json["dataLicense"], "CC0-1.0");
        assert_eq!(json["SPDXID"], "SPDXRef-DOCUMENT");
        assert_eq!(json["packages"][1]["versionInfo"], "20.1.0");
        assert_eq!(json["packages"][1]["filesAnalyzed"], false);
        assert_eq!(json["packages"][1]["externalRefs"][0]["referenceType"], "purl");
        assert_eq!(json["relationships"][0]["relatedSpdxElement"], "SPDXRef-Package-root");
    }
}

use serde::{Deserialize, Serialize};

/// Package ecosystem, named after its PURL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Npm,
    Pypi,
    Maven,
    Nuget,
    Gem,
    Composer,
    Golang,
    Cargo,
    Pub,
    Hex,
    Swift,
    Terraform,
    Conan,
    Hackage,
    Opam,
    Cran,
    Julia,
    Nix,
    Github,
    Deb,
    Apk,
    Generic,
}

impl Ecosystem {
    /// The PURL `type` component for this ecosystem.
    pub fn purl_type(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Pypi => "pypi",
            Ecosystem::Maven => "maven",
            Ecosystem::Nuget => "nuget",
            Ecosystem::Gem => "gem",
            Ecosystem::Composer => "composer",
            Ecosystem::Golang => "golang",
            Ecosystem::Cargo => "cargo",
            Ecosystem::Pub => "pub",
            Ecosystem::Hex => "hex",
            Ecosystem::Swift => "swift",
            Ecosystem::Terraform => "terraform",
            Ecosystem::Conan => "conan",
            Ecosystem::Hackage => "hackage",
            Ecosystem::Opam => "opam",
            Ecosystem::Cran => "cran",
            Ecosystem::Julia => "julia",
            Ecosystem::Nix => "nix",
            Ecosystem::Github => "github",
            Ecosystem::Deb => "deb",
            Ecosystem::Apk => "apk",
            Ecosystem::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.purl_type())
    }
}

/// An import/require/use target exactly as written in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportEntry {
    pub module: String,
}

impl ImportEntry {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
        }
    }
}

/// A third-party package inferred from an import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedPackage {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub purl: String,
    pub ecosystem: Ecosystem,
}

impl DetectedPackage {
    pub fn new(ecosystem: Ecosystem, name: impl Into<String>) -> Self {
        let name = name.into();
        let purl = crate::purl::build(ecosystem, &name, None);
        Self {
            name,
            version: None,
            purl,
            ecosystem,
        }
    }

    pub fn with_version(ecosystem: Ecosystem, name: impl Into<String>, version: &str) -> Self {
        let name = name.into();
        let purl = crate::purl::build(ecosystem, &name, Some(version));
        Self {
            name,
            version: Some(version.to_string()),
            purl,
            ecosystem,
        }
    }
}

/// One dependency declared in a lockfile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDependency {
    pub name: String,
    pub version: String,
    pub purl: String,
}

impl ParsedDependency {
    pub fn new(ecosystem: Ecosystem, name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        let version = version.into();
        let purl = crate::purl::build(ecosystem, &name, Some(&version));
        Self {
            name,
            version,
            purl,
        }
    }
}

/// How much the discovered dependency set can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    /// Reserved for manifest-backed data.
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecosystem_serializes_as_purl_type() {
        let json = serde_json::to_string(&Ecosystem::Pypi).unwrap();
        assert_eq!(json, "\"pypi\"");
        assert_eq!(Ecosystem::Golang.to_string(), "golang");
    }

    #[test]
    fn test_detected_package_purl() {
        let pkg = DetectedPackage::new(Ecosystem::Npm, "lodash");
        assert_eq!(pkg.purl, "pkg:npm/lodash");
        let pinned = DetectedPackage::with_version(Ecosystem::Pypi, "requests", "2.31.0");
        assert_eq!(pinned.purl, "pkg:pypi/requests@2.31.0");
    }

    #[test]
    fn test_parsed_dependency_purl() {
        let dep = ParsedDependency::new(Ecosystem::Npm, "lodash", "4.17.21");
        assert_eq!(dep.purl, "pkg:npm/lodash@4.17.21");
    }
}

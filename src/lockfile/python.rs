use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::models::{Ecosystem, ParsedDependency};

static REQUIREMENT_PIN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_\-\.]+)(?:\[[^\]]*\])?\s*==\s*([^\s;#]+)").ok());

fn dep(name: &str, version: &str) -> ParsedDependency {
    ParsedDependency::new(Ecosystem::Pypi, name, version)
}

/// `poetry.lock` and `uv.lock` share the `[[package]]` array shape.
#[derive(Debug, Deserialize)]
struct PackageLock {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    version: Option<String>,
    source: Option<UvSource>,
}

#[derive(Debug, Deserialize)]
struct UvSource {
    editable: Option<String>,
    #[serde(rename = "virtual")]
    virtual_path: Option<String>,
}

pub fn parse_poetry_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let lock: PackageLock = toml::from_str(content)?;
    Ok(lock
        .package
        .iter()
        .filter_map(|p| p.version.as_deref().map(|v| dep(&p.name, v)))
        .collect())
}

/// The project itself and local path members appear in `uv.lock` with an
/// `editable` or `virtual` source.
pub fn parse_uv_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let lock: PackageLock = toml::from_str(content)?;
    Ok(lock
        .package
        .iter()
        .filter(|p| {
            p.source
                .as_ref()
                .map_or(true, |s| s.editable.is_none() && s.virtual_path.is_none())
        })
        .filter_map(|p| p.version.as_deref().map(|v| dep(&p.name, v)))
        .collect())
}

pub fn parse_pipfile_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let json: serde_json::Value = serde_json::from_str(content)?;
    let mut deps = Vec::new();

    for section in &["default", "develop"] {
        if let Some(pkgs) = json.get(section).and_then(|v| v.as_object()) {
            for (name, info) in pkgs {
                // git and path entries carry no version
                if let Some(version) = info.get("version").and_then(|v| v.as_str()) {
                    deps.push(dep(name, version.trim_start_matches("==")));
                }
            }
        }
    }

    Ok(deps)
}

/// Only exact `==` pins are dependencies; ranges, options and includes are skipped.
pub fn parse_requirements_txt(content: &str) -> Result<Vec<ParsedDependency>> {
    let Some(re) = REQUIREMENT_PIN.as_ref() else {
        return Ok(Vec::new());
    };
    let mut deps = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        if let Some(caps) = re.captures(line) {
            deps.push(dep(&caps[1], &caps[2]));
        }
    }

    Ok(deps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requirements_txt() {
        let content = "# comment\nrequests==2.28.1\nflask>=2.0.0\nnumpy==1.24.0 ; python_version >= '3.8'\nuvicorn[standard]==0.23.2\n-r dev.txt\n";
        let deps = parse_requirements_txt(content).unwrap();
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].name, "requests");
        assert_eq!(deps[0].version, "2.28.1");
        assert_eq!(deps[1].name, "numpy");
        assert_eq!(deps[2].purl, "pkg:pypi/uvicorn@0.23.2");
    }

    #[test]
    fn test_parse_pipfile_lock() {
        let content = r#"{
  "_meta": { "hash": { "sha256": "abc" } },
  "default": {
    "requests": { "version": "==2.31.0" },
    "mylib": { "git": "https://github.com/acme/mylib.git" }
  },
  "develop": {
    "pytest": { "version": "==7.4.0" }
  }
}"#;
        let deps = parse_pipfile_lock(content).unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].version, "2.31.0");
        assert_eq!(deps[1].name, "pytest");
    }

    #[test]
    fn test_parse_poetry_lock() {
        let content = r#"
[[package]]
name = "certifi"
version = "2023.7.22"
description = "Python package for providing Mozilla's CA Bundle."
optional = false

[[package]]
name = "Django"
version = "4.2.5"

[metadata]
lock-version = "2.0"
"#;
        let deps = parse_poetry_lock(content).unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[1].purl, "pkg:pypi/django@4.2.5");
    }

    #[test]
    fn test_parse_uv_lock() {
        let content = r#"
version = 1
requires-python = ">=3.11"

[[package]]
name = "anyio"
version = "4.2.0"
source = { registry = "https://pypi.org/simple" }

[[package]]
name = "my-app"
version = "0.1.0"
source = { editable = "." }

[[package]]
name = "tools"
version = "0.0.0"
source = { virtual = "tools" }
"#;
        let deps = parse_uv_lock(content).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "anyio");
    }
}

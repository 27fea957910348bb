use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{Ecosystem, ParsedDependency};

/// Matches lines like `    Newtonsoft.Json (13.0.1)`.
static PAKET_ENTRY: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\s{4}(\S+)\s+\(([^)]+)\)").ok());

fn dep(name: &str, version: &str) -> ParsedDependency {
    ParsedDependency::new(Ecosystem::Nuget, name, version)
}

/// Parse NuGet's `packages.lock.json`:
/// `dependencies.<target framework>.<package>.resolved`. Project references
/// (`"type": "Project"`) are skipped.
pub fn parse_packages_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let json: Value = serde_json::from_str(content)?;
    let mut deps = Vec::new();

    if let Some(frameworks) = json.get("dependencies").and_then(|v| v.as_object()) {
        for packages in frameworks.values().filter_map(|v| v.as_object()) {
            for (name, info) in packages {
                if info.get("type").and_then(|v| v.as_str()) == Some("Project") {
                    continue;
                }
                if let Some(resolved) = info.get("resolved").and_then(|v| v.as_str()) {
                    deps.push(dep(name, resolved));
                }
            }
        }
    }

    Ok(deps)
}

/// Parse `paket.lock`: entries of the `NUGET` section.
pub fn parse_paket_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let Some(re) = PAKET_ENTRY.as_ref() else {
        return Ok(Vec::new());
    };
    let mut deps = Vec::new();
    let mut in_nuget = false;

    for line in content.lines() {
        if line.trim_end() == "NUGET" {
            in_nuget = true;
            continue;
        }
        // A new top-level section ends the NUGET block
        if !line.starts_with(' ') && !line.is_empty() {
            in_nuget = false;
        }
        if in_nuget {
            if let Some(caps) = re.captures(line) {
                deps.push(dep(&caps[1], &caps[2]));
            }
        }
    }

    Ok(deps)
}

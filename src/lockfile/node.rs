use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{Ecosystem, ParsedDependency};

static YARN_VERSION: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"^\s+version:?\s+"?([^"\s]+)"?"#).ok());

fn dep(name: &str, version: &str) -> ParsedDependency {
    ParsedDependency::new(Ecosystem::Npm, name, version)
}

/// Parse `package-lock.json` / `npm-shrinkwrap.json`.
///
/// Lockfile v2/v3 lists every installed path in `packages`; v1 only has the
/// nested `dependencies` tree.
pub fn parse_package_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let json: Value = serde_json::from_str(content)?;
    let mut deps = Vec::new();

    if let Some(packages) = json.get("packages").and_then(|v| v.as_object()) {
        for (pkg_path, info) in packages {
            // "" is the project itself
            if pkg_path.is_empty() || info.get("link").and_then(|v| v.as_bool()) == Some(true) {
                continue;
            }
            let Some(version) = info.get("version").and_then(|v| v.as_str()) else {
                continue;
            };
            // "node_modules/a/node_modules/@scope/b" -> "@scope/b"; other
            // paths are workspace sources
            let Some(i) = pkg_path.rfind("node_modules/") else {
                continue;
            };
            let name = &pkg_path[i + "node_modules/".len()..];
            deps.push(dep(name, version));
        }
        return Ok(deps);
    }

    if let Some(tree) = json.get("dependencies").and_then(|v| v.as_object()) {
        walk_v1(tree, &mut deps);
    }
    Ok(deps)
}

fn walk_v1(tree: &serde_json::Map<String, Value>, deps: &mut Vec<ParsedDependency>) {
    for (name, info) in tree {
        if let Some(version) = info.get("version").and_then(|v| v.as_str()) {
            // v1 records local links as "file:..." versions
            if !version.starts_with("file:") {
                deps.push(dep(name, version));
            }
        }
        if let Some(nested) = info.get("dependencies").and_then(|v| v.as_object()) {
            walk_v1(nested, deps);
        }
    }
}

/// Parse `yarn.lock`, both the classic v1 format and berry (v2+).
///
/// ```text
/// "@babel/core@^7.0.0", "@babel/core@^7.1.0":     lodash@npm:^4.17.21:
///   version "7.22.5"                                  version: 4.17.21
/// ```
pub fn parse_yarn_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let Some(version_re) = YARN_VERSION.as_ref() else {
        bail!("yarn.lock version pattern failed to compile");
    };
    let mut deps = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        if line.is_empty() || line.starts_with('#') || line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }
        // berry metadata block
        if line.starts_with("__metadata") {
            continue;
        }
        let header = line.trim_end().trim_end_matches(':');
        let first_spec = header.split(", ").next().unwrap_or(header).trim_matches('"');
        let Some(name) = spec_name(first_spec) else {
            continue;
        };

        let mut version = None;
        while let Some(next) = lines.peek() {
            if next.is_empty() || !(next.starts_with(' ') || next.starts_with('\t')) {
                break;
            }
            if version.is_none() {
                version = version_re.captures(next).map(|c| c[1].to_string());
            }
            lines.next();
        }

        if first_spec.contains("@workspace:") || first_spec.contains("@link:") {
            continue;
        }
        if let Some(version) = version {
            deps.push(dep(name, &version));
        }
    }

    Ok(deps)
}

/// `@scope/pkg@npm:^1.0.0` -> `@scope/pkg`
fn spec_name(spec: &str) -> Option<&str> {
    let at = spec.get(1..)?.find('@')? + 1;
    Some(&spec[..at])
}

/// Parse `pnpm-lock.yaml`. Package keys have changed shape across lockfile
/// versions: `/name/1.0.0`, `/name@1.0.0`, `name@1.0.0(peer@2.0.0)`.
pub fn parse_pnpm_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    let mut deps = Vec::new();

    if let Some(packages) = yaml.get("packages").and_then(|v| v.as_mapping()) {
        for key in packages.keys() {
            if let Some((name, version)) = key.as_str().and_then(pnpm_key) {
                deps.push(dep(&name, &version));
            }
        }
    }

    Ok(deps)
}

fn pnpm_key(key: &str) -> Option<(String, String)> {
    let key = key.trim_start_matches('/');
    let key = match key.find('(') {
        Some(i) => &key[..i],
        None => key,
    };

    let scope_len = if key.starts_with('@') { key.find('/')? + 1 } else { 0 };
    // "name@version", or "name/version" before lockfile v6
    let sep = scope_len + key[scope_len..].find(['@', '/'])?;
    let (name, version) = (&key[..sep], &key[sep + 1..]);
    // "name@1.0.0_peer@2.0.0" in lockfile v5
    let version = version.split('_').next().unwrap_or(version);
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name.to_string(), version.to_string()))
}

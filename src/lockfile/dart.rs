use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;

use crate::models::{Ecosystem, ParsedDependency};

#[derive(Debug, Deserialize)]
struct PubspecLock {
    #[serde(default)]
    packages: BTreeMap<String, PubspecPackage>,
}

#[derive(Debug, Deserialize)]
struct PubspecPackage {
    version: Option<String>,
    source: Option<String>,
}

/// Parse `pubspec.lock`. Only `hosted` packages are pub.dev dependencies;
/// `sdk`, `path` and `git` entries are skipped.
pub fn parse_pubspec_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let lock: PubspecLock = serde_yaml::from_str(content)?;
    Ok(lock
        .packages
        .iter()
        .filter(|(_, p)| p.source.as_deref() == Some("hosted"))
        .filter_map(|(name, p)| {
            p.version
                .as_deref()
                .map(|v| ParsedDependency::new(Ecosystem::Pub, name, v))
        })
        .collect())
}

use anyhow::Result;
use serde::Deserialize;

use crate::models::{Ecosystem, ParsedDependency};

#[derive(Debug, Deserialize)]
struct ComposerLock {
    #[serde(default)]
    packages: Vec<ComposerPackage>,
    #[serde(default, rename = "packages-dev")]
    packages_dev: Vec<ComposerPackage>,
}

#[derive(Debug, Deserialize)]
struct ComposerPackage {
    name: String,
    version: String,
}

/// Parse `composer.lock`. Tag versions lose their `v` prefix (`v6.4.0` -> `6.4.0`).
pub fn parse_composer_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let lock: ComposerLock = serde_json::from_str(content)?;
    Ok(lock
        .packages
        .iter()
        .chain(lock.packages_dev.iter())
        .map(|p| {
            let version = p
                .version
                .strip_prefix('v')
                .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
                .unwrap_or(&p.version);
            ParsedDependency::new(Ecosystem::Composer, &p.name, version)
        })
        .collect())
}

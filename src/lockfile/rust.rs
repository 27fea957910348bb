use anyhow::Result;
use serde::Deserialize;

use crate::models::{Ecosystem, ParsedDependency};

#[derive(Debug, Deserialize)]
struct CargoLock {
    #[serde(default)]
    package: Vec<CargoLockPackage>,
}

#[derive(Debug, Deserialize)]
struct CargoLockPackage {
    name: String,
    version: String,
    source: Option<String>,
}

/// Parse `Cargo.lock`. Workspace members have no `source` and are skipped.
pub fn parse_cargo_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let lock: CargoLock = toml::from_str(content)?;
    Ok(lock
        .package
        .into_iter()
        .filter(|p| p.source.is_some())
        .map(|p| ParsedDependency::new(Ecosystem::Cargo, p.name, p.version))
        .collect())
}

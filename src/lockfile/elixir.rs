use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Ecosystem, ParsedDependency};

/// `"plug": {:hex, :plug, "1.15.2", "sha...", [:mix], [...], "hexpm", "sha..."},`
static HEX_ENTRY: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#""([\w-]+)":\s*\{:hex,\s*:"?([\w-]+)"?,\s*"([^"]+)""#).ok());

/// Parse `mix.lock`. Git and path dependencies have no hex entry and are skipped.
/// The package name reported is the hex package, which may differ from the
/// dependency's app name.
pub fn parse_mix_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let Some(re) = HEX_ENTRY.as_ref() else {
        return Ok(Vec::new());
    };
    Ok(re
        .captures_iter(content)
        .map(|caps| ParsedDependency::new(Ecosystem::Hex, &caps[2], &caps[3]))
        .collect())
}

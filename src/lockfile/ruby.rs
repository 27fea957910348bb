use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Ecosystem, ParsedDependency};

/// `    rails (7.1.2)` and platform gems like `    nokogiri (1.15.5-x86_64-linux)`.
static SPEC: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^ {4}([A-Za-z0-9_\-\.]+) \(([^)]+)\)$").ok());

/// Parse the `GEM` section of `Gemfile.lock`. Only the four-space `specs:`
/// entries are gems; deeper lines are their dependency constraints.
pub fn parse_gemfile_lock(content: &str) -> Result<Vec<ParsedDependency>> {
    let Some(re) = SPEC.as_ref() else {
        return Ok(Vec::new());
    };
    let mut deps = Vec::new();
    let mut in_gem = false;

    for line in content.lines() {
        if !line.starts_with(' ') && !line.is_empty() {
            in_gem = line.trim_end() == "GEM";
            continue;
        }
        if in_gem {
            if let Some(caps) = re.captures(line.trim_end()) {
                deps.push(ParsedDependency::new(Ecosystem::Gem, &caps[1], &caps[2]));
            }
        }
    }

    Ok(deps)
}

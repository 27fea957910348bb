use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// Go packages resolved to their module path.
pub struct GoPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^package\s+\w+\s*$", 25),
        (r"(?m)^import\s+(\(|\w*\s*\x22)", 20),
        (r"(?m)^func\s+(\([^)]*\)\s*)?\w+\s*\(", 20),
        (r":=", 10),
        (r"\bfmt\.(Print|Sprint|Errorf)", 10),
        (r"\bif\s+err\s*!=\s*nil\b", 15),
    ])
});

static SINGLE: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r#"(?m)^\s*import\s+(?:[\w.]+\s+)?"([^"]+)""#));
static BLOCK: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?ms)^\s*import\s*\((.*?)\)"));
static MODULE_DIRECTIVE: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"(?m)^\s*module\s+"?([^\s"]+)"?"#));
static BLOCK_LINE: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"(?m)^\s*(?:[\w.]+\s+)?"([^"]+)""#));

/// Module roots where the module path has three segments (`host/owner/repo`).
const THREE_SEGMENT_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org", "golang.org", "codeberg.org", "gitea.com"];

fn is_major_suffix(segment: &str) -> bool {
    segment.len() > 1 && segment.starts_with('v') && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// The `module` directive of a `go.mod`.
pub fn module_directive(go_mod: &str) -> Option<String> {
    let re = MODULE_DIRECTIVE.as_ref()?;
    go_mod
        .lines()
        .map(|l| l.split("//").next().unwrap_or_default())
        .find_map(|l| re.captures(l))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// The module path that provides an import path.
pub(crate) fn module_path(import: &str) -> Option<String> {
    let segments: Vec<&str> = import.split('/').collect();
    let host = *segments.first()?;
    let len = if host == "gopkg.in" {
        2
    } else if THREE_SEGMENT_HOSTS.contains(&host) {
        3
    } else {
        2
    };
    if segments.len() < len {
        return None;
    }
    let mut module: Vec<&str> = segments[..len].to_vec();
    if let Some(next) = segments.get(len) {
        if is_major_suffix(next) {
            module.push(next);
        }
    }
    Some(module.join("/"))
}

impl LanguagePlugin for GoPlugin {
    fn id(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".go"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = super::capture_modules(&SINGLE, content);
        if let (Some(block), Some(line)) = (BLOCK.as_ref(), BLOCK_LINE.as_ref()) {
            for caps in block.captures_iter(content) {
                for inner in line.captures_iter(&caps[1]) {
                    imports.push(ImportEntry::new(&inner[1]));
                }
            }
        }
        imports
    }

    /// Standard library paths have no dot in their first element.
    fn is_std_lib(&self, module: &str) -> bool {
        let first = module.split('/').next().unwrap_or(module);
        !first.contains('.')
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        if self.is_std_lib(module) {
            return None;
        }
        let path = module_path(module)?;
        Some(DetectedPackage::new(Ecosystem::Golang, path))
    }
}

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

pub struct RustPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*use\s+(std|crate|super|self)::", 25),
        (r"(?m)^\s*(pub(\([\w:]+\))?\s+)?fn\s+\w+(<[^>]*>)?\s*\(", 20),
        (r"\blet\s+(mut\s+)?\w+", 10),
        (r"(?m)^\s*impl(<[^>]*>)?\s+[\w:<>]+", 15),
        (r"#\[(derive|test|cfg|tokio::main)", 20),
        (r"\w+!\(", 5),
        (r"->\s*(Result|Option|Self|&?str|String|bool|u\d+|i\d+)\b", 10),
    ])
});

static USE: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r"(?m)^\s*(?:pub(?:\([\w:]+\))?\s+)?use\s+:?:?([A-Za-z_]\w*)"));
static EXTERN_CRATE: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r"(?m)^\s*(?:pub\s+)?extern\s+crate\s+([A-Za-z_]\w*)"));
static MOD_DECL: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r"(?m)^\s*(?:pub(?:\([\w:]+\))?\s+)?mod\s+([A-Za-z_]\w*)"));

const STDLIB: &[&str] = &["std", "core", "alloc", "proc_macro", "test", "crate", "self", "super"];

impl LanguagePlugin for RustPlugin {
    fn id(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".rs"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    /// Root path segment of each `use`/`extern crate`; modules declared in the
    /// same file with `mod` are local and dropped.
    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let local: HashSet<String> = super::capture_modules(&MOD_DECL, content)
            .into_iter()
            .map(|m| m.module)
            .collect();
        let mut imports = super::capture_modules(&USE, content);
        imports.extend(super::capture_modules(&EXTERN_CRATE, content));
        imports.retain(|i| !local.contains(&i.module));
        imports
    }

    fn is_std_lib(&self, module: &str) -> bool {
        STDLIB.contains(&module)
    }

    /// Crate names use `-` on crates.io where code uses `_`; the underscore
    /// form is kept since crates.io treats both as the same crate.
    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        if self.is_std_lib(module) {
            return None;
        }
        Some(DetectedPackage::new(Ecosystem::Cargo, module))
    }
}

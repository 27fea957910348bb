use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

pub struct AdaPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?mi)^\s*with\s+[\w.]+(\s*,\s*[\w.]+)*\s*;", 20),
        (r"(?mi)^\s*use\s+[\w.]+\s*;", 10),
        (r"(?mi)^\s*(procedure|function)\s+\w+(\s*\([^)]*\))?\s*(return\s+\w+\s*)?is\b", 25),
        (r"(?mi)^\s*package\s+(body\s+)?[\w.]+\s+is\b", 25),
        (r"(?mi)^\s*end\s+[\w.]+\s*;", 10),
        (r":=", 5),
    ])
});

static WITH: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?mi)^\s*(?:limited\s+|private\s+)*with\s+([\w.\s,]+);"));

const STDLIB_ROOTS: &[&str] = &["ada", "system", "interfaces", "gnat"];

/// Alire crates by root package.
const KNOWN: &[(&str, &str)] = &[
    ("AWS", "aws"),
    ("GNATCOLL", "gnatcoll"),
    ("Alire", "alire"),
    ("AUnit", "aunit"),
    ("Templates_Parser", "templates_parser"),
    ("XML_EZ_Out", "xmlezout"),
    ("Ahven", "ahven"),
];

fn root(module: &str) -> &str {
    module.split('.').next().unwrap_or(module)
}

impl LanguagePlugin for AdaPlugin {
    fn id(&self) -> &'static str {
        "ada"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".adb", ".ads", ".ada"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    /// `with A, B.C;` names several units at once.
    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        super::capture_modules(&WITH, content)
            .into_iter()
            .flat_map(|entry| {
                entry
                    .module
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(ImportEntry::new)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn is_std_lib(&self, module: &str) -> bool {
        STDLIB_ROOTS.contains(&root(module).to_lowercase().as_str())
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        let root = root(module);
        KNOWN
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(root))
            .map(|(_, package)| DetectedPackage::new(Ecosystem::Generic, *package))
    }
}

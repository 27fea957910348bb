use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

pub struct RPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*(library|require)\s*\(\s*[\w.]+\s*\)", 30),
        (r"(?m)^\s*[\w.]+\s*<-\s*", 25),
        (r"<-\s*function\s*\(", 15),
        (r"%>%", 15),
        (r"\b(data\.frame|c)\s*\(", 5),
        (r"\b[a-zA-Z][\w.]*::[a-zA-Z_.]", 5),
    ])
});

static LOAD: Lazy<Option<Regex>> = Lazy::new(|| {
    pattern(r#"\b(?:library|require|requireNamespace)\s*\(\s*["']?([A-Za-z][\w.]*)["']?"#)
});
static NAMESPACED: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"\b([A-Za-z][\w.]*):::?[A-Za-z._]"));

const BASE_PACKAGES: &[&str] = &[
    "base", "stats", "utils", "methods", "graphics", "grDevices", "datasets", "tools",
    "parallel", "compiler", "grid", "splines", "stats4", "tcltk",
];

impl LanguagePlugin for RPlugin {
    fn id(&self) -> &'static str {
        "r"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".r", ".rmd"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    /// `library()`/`require()` calls first, then `pkg::fn` references.
    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = super::capture_modules(&LOAD, content);
        imports.extend(super::capture_modules(&NAMESPACED, content));
        imports
    }

    fn is_std_lib(&self, module: &str) -> bool {
        BASE_PACKAGES.contains(&module)
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        Some(DetectedPackage::new(Ecosystem::Cran, module))
    }
}

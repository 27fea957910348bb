use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, ImportEntry};

/// COBOL copybooks and called programs. Nothing maps to a package registry.
pub struct CobolPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?mi)^.{0,7}\s*identification\s+division\s*\.", 35),
        (r"(?mi)^.{0,7}\s*procedure\s+division\b", 25),
        (r"(?mi)^.{0,7}\s*(data|environment)\s+division\s*\.", 15),
        (r"(?mi)^.{0,7}\s*program-id\s*\.", 15),
        (r"(?mi)\bworking-storage\s+section\s*\.", 10),
        (r"(?mi)\bpic(ture)?\s+[x9sv(]", 10),
    ])
});

static COPY: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"(?mi)\bcopy\s+["']?([\w-]+)["']?"#));
static CALL: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"(?mi)\bcall\s+["']([\w-]+)["']"#));

impl LanguagePlugin for CobolPlugin {
    fn id(&self) -> &'static str {
        "cobol"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".cbl", ".cob", ".cpy", ".cobol"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = super::capture_modules(&COPY, content);
        imports.extend(super::capture_modules(&CALL, content));
        imports
    }

    /// Runtime library routines (`CBL_*`) ship with the compiler.
    fn is_std_lib(&self, module: &str) -> bool {
        module.to_uppercase().starts_with("CBL_")
    }

    fn map_to_package(&self, _module: &str) -> Option<DetectedPackage> {
        None
    }
}

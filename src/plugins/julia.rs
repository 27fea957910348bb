use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

pub struct JuliaPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*using\s+[A-Z]\w*(\s*,\s*[A-Z]\w*)*\s*$", 30),
        (r"(?m)^\s*function\s+[\w!.]+\s*\(", 15),
        (r"(?m)^\s*end\s*$", 10),
        (r"(?m)^\s*(mutable\s+)?struct\s+[A-Z]\w*", 10),
        (r"::\s*(Int|Float|String|Vector|Array|Bool|Any)\w*", 15),
        (r"\b\w+\.\(", 10),
        (r"(?m)^\s*module\s+[A-Z]\w*\s*$", 10),
    ])
});

static USING: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?m)^\s*(?:using|import)\s+([^\n#]+)"));

const STDLIB: &[&str] = &[
    "Base", "Core", "Main", "LinearAlgebra", "Statistics", "Random", "Dates", "Printf", "Test",
    "Distributed", "SparseArrays", "Serialization", "Sockets", "Pkg", "InteractiveUtils",
    "Logging", "Markdown", "Mmap", "SharedArrays", "SHA", "UUIDs", "Unicode", "DelimitedFiles",
    "Downloads", "FileWatching", "Libdl", "LibGit2", "Profile", "REPL", "TOML", "Base64",
    "CRC32c", "Tar", "ArgTools", "LazyArtifacts", "Artifacts", "NetworkOptions", "Future",
];

fn root(module: &str) -> &str {
    module.split('.').next().unwrap_or(module)
}

impl LanguagePlugin for JuliaPlugin {
    fn id(&self) -> &'static str {
        "julia"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".jl"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    /// `using A, B.C` lists several modules; `import X: f, g` names symbols
    /// after the colon. Relative modules (`.Local`) are skipped.
    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        super::capture_modules(&USING, content)
            .into_iter()
            .flat_map(|entry| {
                let head = entry.module.split(':').next().unwrap_or_default().to_string();
                head.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty() && !m.starts_with('.'))
                    .map(ImportEntry::new)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn is_std_lib(&self, module: &str) -> bool {
        STDLIB.contains(&root(module))
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        let root = root(module);
        if root.is_empty() {
            return None;
        }
        Some(DetectedPackage::new(Ecosystem::Julia, root))
    }
}

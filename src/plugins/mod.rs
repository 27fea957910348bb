//! Language plugins used by the import scanner.
//!
//! Each plugin is a unit struct implementing [`LanguagePlugin`]. [`PLUGINS`]
//! lists all of them in registration order; [`select_plugin`] picks the best
//! match for a file by a linear best-confidence scan over that table.
//!
//! Scoring convention shared by every plugin: a matching extension is worth
//! [`EXTENSION_WEIGHT`] points, each matched content signal adds its weight
//! (signals for a sibling language may carry a negative weight), and the total
//! is clamped to `0..=100`.

use regex::Regex;

use crate::models::{DetectedPackage, ImportEntry};

pub mod ada;
pub mod assembly;
pub mod bash;
pub mod c;
pub mod cobol;
pub mod cpp;
pub mod csharp;
pub mod dart;
pub mod elixir;
pub mod erlang;
pub mod fortran;
pub mod go;
pub mod haskell;
pub mod java;
pub mod jsts;
pub mod julia;
pub mod nix;
pub mod ocaml;
pub mod pascal;
pub mod php;
pub mod python;
pub mod r;
pub mod ruby;
pub mod rust;
pub mod swift;
pub mod terraform;

/// Points contributed by a matching file extension.
pub const EXTENSION_WEIGHT: i32 = 40;

/// Minimum winning confidence for a file to be attributed to a language.
pub const MIN_CONFIDENCE: u8 = 40;

/// Capability set for one language or ecosystem.
pub trait LanguagePlugin: Send + Sync {
    /// Stable identifier, e.g. `"python"`.
    fn id(&self) -> &'static str;

    /// Lowercase file suffixes including the dot, e.g. `".py"`.
    fn extensions(&self) -> &'static [&'static str];

    /// Confidence in `0..=100` that `content` (named `filename`) is this language.
    fn detect(&self, content: &str, filename: &str) -> u8;

    /// Import targets as written in the source, before any filtering.
    fn extract_imports(&self, content: &str) -> Vec<ImportEntry>;

    fn is_std_lib(&self, module: &str) -> bool;

    /// Map an import target to a package coordinate, `None` when unmappable.
    fn map_to_package(&self, module: &str) -> Option<DetectedPackage>;
}

/// All plugins in registration order. Ties in [`select_plugin`] go to the
/// earlier entry.
pub static PLUGINS: &[&dyn LanguagePlugin] = &[
    &python::PythonPlugin,
    &jsts::JsTsPlugin,
    &java::JavaPlugin,
    &csharp::CSharpPlugin,
    &ruby::RubyPlugin,
    &php::PhpPlugin,
    &go::GoPlugin,
    &rust::RustPlugin,
    &dart::DartPlugin,
    &elixir::ElixirPlugin,
    &swift::SwiftPlugin,
    &terraform::TerraformPlugin,
    &c::CPlugin,
    &cpp::CppPlugin,
    &assembly::AssemblyPlugin,
    &fortran::FortranPlugin,
    &cobol::CobolPlugin,
    &ada::AdaPlugin,
    &erlang::ErlangPlugin,
    &haskell::HaskellPlugin,
    &ocaml::OcamlPlugin,
    &r::RPlugin,
    &julia::JuliaPlugin,
    &pascal::PascalPlugin,
    &bash::BashPlugin,
    &nix::NixPlugin,
];

/// Pick the plugin with the strictly highest confidence for this file.
///
/// Every plugin is consulted, not only those whose extension matches, so
/// content signals can outvote a misleading suffix. The caller applies the
/// [`MIN_CONFIDENCE`] gate.
pub fn select_plugin(filename: &str, content: &str) -> Option<(&'static dyn LanguagePlugin, u8)> {
    let mut best: Option<(&'static dyn LanguagePlugin, u8)> = None;
    for plugin in PLUGINS.iter().copied() {
        let confidence = plugin.detect(content, filename);
        match best {
            Some((_, top)) if confidence <= top => {}
            _ => best = Some((plugin, confidence)),
        }
    }
    best
}

/// Whether any plugin claims this path by extension.
pub fn is_source_file(path: &str) -> bool {
    PLUGINS.iter().any(|p| has_extension(path, p.extensions()))
}

pub fn plugin_by_id(id: &str) -> Option<&'static dyn LanguagePlugin> {
    PLUGINS.iter().copied().find(|p| p.id() == id)
}

pub fn has_extension(filename: &str, extensions: &[&str]) -> bool {
    let lower = filename.to_lowercase();
    extensions.iter().any(|ext| lower.ends_with(ext))
}

/// A weighted content signal.
pub(crate) struct Signal {
    re: Regex,
    weight: i32,
}

pub(crate) fn signals(patterns: &[(&str, i32)]) -> Vec<Signal> {
    patterns
        .iter()
        .filter_map(|(p, w)| Regex::new(p).ok().map(|re| Signal { re, weight: *w }))
        .collect()
}

pub(crate) fn pattern(p: &str) -> Option<Regex> {
    Regex::new(p).ok()
}

pub(crate) fn score(filename: &str, extensions: &[&str], content: &str, signals: &[Signal]) -> u8 {
    let mut total = if has_extension(filename, extensions) {
        EXTENSION_WEIGHT
    } else {
        0
    };
    for signal in signals {
        if signal.re.is_match(content) {
            total += signal.weight;
        }
    }
    total.clamp(0, 100) as u8
}

/// Collect capture group 1 of every match as an import entry.
pub(crate) fn capture_modules(re: &Option<Regex>, content: &str) -> Vec<ImportEntry> {
    let Some(re) = re else {
        return Vec::new();
    };
    re.captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|m| !m.is_empty())
        .map(ImportEntry::new)
        .collect()
}

/// Case-sensitive prefix match on dotted/segmented module names: `prefix`
/// matches `prefix` itself and anything below `prefix<sep>`.
pub(crate) fn under(module: &str, prefix: &str, sep: char) -> bool {
    module == prefix
        || (module.starts_with(prefix) && module[prefix.len()..].starts_with(sep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_has_26_unique_plugins() {
        assert_eq!(PLUGINS.len(), 26);
        let ids: HashSet<&str> = PLUGINS.iter().map(|p| p.id()).collect();
        assert_eq!(ids.len(), 26);
    }

    #[test]
    fn test_registration_order() {
        let ids: Vec<&str> = PLUGINS.iter().map(|p| p.id()).collect();
        assert_eq!(
            ids,
            vec![
                "python", "jsts", "java", "csharp", "ruby", "php", "go", "rust", "dart",
                "elixir", "swift", "terraform", "c", "cpp", "assembly", "fortran", "cobol",
                "ada", "erlang", "haskell", "ocaml", "r", "julia", "pascal", "bash", "nix",
            ]
        );
    }

    #[test]
    fn test_empty_content_yields_no_imports() {
        for plugin in PLUGINS {
            assert!(
                plugin.extract_imports("").is_empty(),
                "{} extracted imports from empty input",
                plugin.id()
            );
        }
    }

    #[test]
    fn test_every_plugin_has_extensions() {
        for plugin in PLUGINS {
            assert!(!plugin.extensions().is_empty(), "{}", plugin.id());
            for ext in plugin.extensions() {
                assert!(ext.starts_with('.'), "{}: {}", plugin.id(), ext);
                assert_eq!(ext.to_lowercase(), *ext, "{}: {}", plugin.id(), ext);
            }
        }
    }

    #[test]
    fn test_detect_is_pure() {
        let samples = [
            ("main.py", "import os\nimport requests\n\ndef main():\n    pass\n"),
            ("index.ts", "import express from 'express';\nconst app = express();\n"),
            ("widget.h", "#include <vector>\nnamespace ui { class Widget {}; }\n"),
            ("README", "plain text"),
        ];
        for (name, content) in samples {
            for plugin in PLUGINS {
                let first = plugin.detect(content, name);
                let second = plugin.detect(content, name);
                assert_eq!(first, second, "{} on {}", plugin.id(), name);
                assert!(first <= 100);
            }
        }
    }

    #[test]
    fn test_cpp_in_header_beats_c() {
        let content = r#"#pragma once
#include <vector>
#include <string>

namespace geometry {

template <typename T>
class Polygon {
public:
    std::vector<T> points;
};

}
"#;
        let c = c::CPlugin.detect(content, "polygon.h");
        let cpp = cpp::CppPlugin.detect(content, "polygon.h");
        assert!(cpp > c, "cpp={} c={}", cpp, c);

        let (winner, confidence) = select_plugin("polygon.h", content).unwrap();
        assert_eq!(winner.id(), "cpp");
        assert!(confidence >= MIN_CONFIDENCE);
    }

    #[test]
    fn test_plain_c_header_stays_c() {
        let content = "#ifndef UTIL_H\n#define UTIL_H\n#include <stdio.h>\n\ntypedef struct { int x; } point_t;\nvoid print_point(const point_t *p);\n#endif\n";
        let (winner, _) = select_plugin("util.h", content).unwrap();
        assert_eq!(winner.id(), "c");
    }

    #[test]
    fn test_select_plugin_by_extension() {
        let (winner, confidence) = select_plugin("app/main.go", "package main\n\nimport \"fmt\"\n").unwrap();
        assert_eq!(winner.id(), "go");
        assert!(confidence >= MIN_CONFIDENCE);
    }

    #[test]
    fn test_unknown_file_below_threshold() {
        let (_, confidence) = select_plugin("notes.txt", "shopping list: milk, eggs").unwrap();
        assert!(confidence < MIN_CONFIDENCE);
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file("src/lib.rs"));
        assert!(is_source_file("Component.TSX"));
        assert!(is_source_file("infra/main.tf"));
        assert!(!is_source_file("README.md"));
        assert!(!is_source_file("Makefile"));
    }

    #[test]
    fn test_std_lib_never_maps_for_known_std_modules() {
        let cases = [
            ("python", "os"),
            ("jsts", "fs"),
            ("java", "java.util.List"),
            ("go", "net/http"),
            ("rust", "std"),
            ("ruby", "json"),
            ("r", "stats"),
            ("julia", "LinearAlgebra"),
        ];
        for (id, module) in cases {
            let plugin = plugin_by_id(id).unwrap();
            assert!(plugin.is_std_lib(module), "{} should treat {} as stdlib", id, module);
        }
    }

    #[test]
    fn test_under() {
        assert!(under("java.util", "java", '.'));
        assert!(under("java", "java", '.'));
        assert!(!under("javax.swing", "java", '.'));
    }
}

use once_cell::sync::Lazy;
use regex::Regex;

use super::{capture_modules, pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// JavaScript and TypeScript, including JSX/TSX and single-file components.
pub struct JsTsPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r#"(?m)^\s*import\s+(type\s+)?[\w*{}\s,]+\s+from\s+['"]"#, 25),
        (r#"\brequire\(\s*['"][^'"]+['"]\s*\)"#, 20),
        (r"(?m)^\s*(export\s+)?(const|let)\s+\w+\s*=", 10),
        (r"(?m)^\s*export\s+(default|const|function|class|interface|type)\b", 20),
        (r"=>\s*[{(]?", 10),
        (r"\bconsole\.(log|error|warn)\(", 10),
        (r"(?m)^\s*(export\s+)?interface\s+\w+\s*\{", 10),
        (r"\bmodule\.exports\b", 15),
    ])
});

static IMPORT_FROM: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r#"(?m)^\s*(?:import|export)\s[^'";]*?\bfrom\s*['"]([^'"]+)['"]"#));
static IMPORT_BARE: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"(?m)^\s*import\s*['"]([^'"]+)['"]"#));
static REQUIRE: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"\brequire\(\s*['"]([^'"]+)['"]\s*\)"#));
static DYNAMIC_IMPORT: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"\bimport\(\s*['"]([^'"]+)['"]\s*\)"#));

const NODE_BUILTINS: &[&str] = &[
    "assert", "async_hooks", "buffer", "child_process", "cluster", "console", "constants",
    "crypto", "dgram", "diagnostics_channel", "dns", "domain", "events", "fs", "http", "http2",
    "https", "inspector", "module", "net", "os", "path", "perf_hooks", "process", "punycode",
    "querystring", "readline", "repl", "stream", "string_decoder", "sys", "timers", "tls",
    "trace_events", "tty", "url", "util", "v8", "vm", "wasi", "worker_threads", "zlib", "test",
];

/// The npm package portion of a specifier: `@scope/pkg/sub` -> `@scope/pkg`,
/// `pkg/sub` -> `pkg`.
fn package_name(specifier: &str) -> Option<String> {
    let mut parts = specifier.split('/');
    let first = parts.next()?;
    if first.is_empty() {
        return None;
    }
    if first.starts_with('@') {
        let second = parts.next().filter(|s| !s.is_empty())?;
        Some(format!("{}/{}", first, second))
    } else {
        Some(first.to_string())
    }
}

fn is_local(specifier: &str) -> bool {
    specifier.starts_with('.')
        || specifier.starts_with('/')
        || specifier.starts_with("~/")
        || specifier.starts_with("@/")
        || specifier.starts_with('#')
        || (specifier.contains(':') && !specifier.starts_with("node:"))
}

impl LanguagePlugin for JsTsPlugin {
    fn id(&self) -> &'static str {
        "jsts"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".js", ".jsx", ".mjs", ".cjs", ".ts", ".tsx", ".mts", ".cts", ".vue", ".svelte"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = capture_modules(&IMPORT_FROM, content);
        imports.extend(capture_modules(&IMPORT_BARE, content));
        imports.extend(capture_modules(&REQUIRE, content));
        imports.extend(capture_modules(&DYNAMIC_IMPORT, content));
        imports.retain(|i| !is_local(&i.module));
        imports
    }

    fn is_std_lib(&self, module: &str) -> bool {
        if module.starts_with("node:") || module.starts_with("bun:") {
            return true;
        }
        package_name(module).is_some_and(|name| NODE_BUILTINS.contains(&name.as_str()))
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        if is_local(module) {
            return None;
        }
        let name = package_name(module)?;
        let valid = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '/' | '-' | '_' | '.'));
        if !valid {
            return None;
        }
        Some(DetectedPackage::new(Ecosystem::Npm, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modules(content: &str) -> Vec<String> {
        JsTsPlugin
            .extract_imports(content)
            .into_iter()
            .map(|i| i.module)
            .collect()
    }

    #[test]
    fn test_extract_imports() {
        let src = r#"
import React, { useState } from 'react';
import type { Config } from "@acme/config/types";
import './styles.css';
export { helper } from "../lib/helper";
const fs = require('fs');
const lodash = require("lodash/fp");
const lazy = await import('chart.js');
import local from '@/components/Local';
"#;
        assert_eq!(
            modules(src),
            vec!["react", "@acme/config/types", "fs", "lodash/fp", "chart.js"]
        );
    }

    #[test]
    fn test_is_std_lib() {
        assert!(JsTsPlugin.is_std_lib("fs"));
        assert!(JsTsPlugin.is_std_lib("fs/promises"));
        assert!(JsTsPlugin.is_std_lib("node:path"));
        assert!(!JsTsPlugin.is_std_lib("express"));
    }

    #[test]
    fn test_map_to_package() {
        let scoped = JsTsPlugin.map_to_package("@acme/config/types").unwrap();
        assert_eq!(scoped.name, "@acme/config");
        assert_eq!(scoped.purl, "pkg:npm/%40acme/config");
        assert_eq!(JsTsPlugin.map_to_package("lodash/fp").unwrap().name, "lodash");
        assert!(JsTsPlugin.map_to_package("./util").is_none());
        assert!(JsTsPlugin.map_to_package("https://cdn.example.com/x.js").is_none());
    }

    #[test]
    fn test_detect() {
        let src = "import express from 'express';\n\nexport const app = express();\napp.get('/', (req, res) => res.send('ok'));\n";
        assert!(JsTsPlugin.detect(src, "server.ts") >= 80);
    }
}

use once_cell::sync::Lazy;
use regex::Regex;

use super::{capture_modules, pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

pub struct RubyPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r#"(?m)^\s*require\s+['"][\w/\-.]+['"]\s*$"#, 25),
        (r#"(?m)^\s*require_relative\s+['"]"#, 20),
        (r"(?m)^\s*def\s+[\w?!.]+(\(.*\))?\s*$", 15),
        (r"(?m)^\s*end\s*$", 15),
        (r"(?m)^\s*(class|module)\s+[A-Z]\w*(\s*<\s*[\w:]+)?\s*$", 10),
        (r"\bdo\s*\|[\w,\s]+\|", 15),
        (r"\battr_(reader|writer|accessor)\s+:", 15),
        (r"\bputs\s", 5),
    ])
});

static REQUIRE: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r#"(?m)^\s*require\s*\(?\s*['"]([^'"]+)['"]"#));

const STDLIB: &[&str] = &[
    "English", "abbrev", "base64", "benchmark", "bigdecimal", "cgi", "coverage", "csv", "date",
    "delegate", "digest", "drb", "erb", "etc", "expect", "fcntl", "fiber", "fiddle", "fileutils",
    "find", "forwardable", "getoptlong", "io", "ipaddr", "irb", "json", "logger", "matrix",
    "monitor", "mutex_m", "net", "objspace", "observer", "open-uri", "open3", "openssl",
    "optparse", "ostruct", "pathname", "pp", "prettyprint", "prime", "pstore", "psych",
    "racc", "rbconfig", "rdoc", "readline", "reline", "resolv", "ripper", "securerandom",
    "set", "shellwords", "singleton", "socket", "stringio", "strscan", "syslog", "tempfile",
    "time", "timeout", "tmpdir", "tsort", "un", "uri", "weakref", "yaml", "zlib", "rubygems",
    "bundler", "minitest", "test", "thread", "continuation", "enumerator", "rational",
    "complex",
];

/// Require paths whose gem is named differently.
const ALIASES: &[(&str, &str)] = &[
    ("active_support", "activesupport"),
    ("active_record", "activerecord"),
    ("active_model", "activemodel"),
    ("active_job", "activejob"),
    ("action_controller", "actionpack"),
    ("action_dispatch", "actionpack"),
    ("action_view", "actionview"),
    ("action_mailer", "actionmailer"),
    ("action_cable", "actioncable"),
    ("rails", "railties"),
    ("rspec", "rspec-core"),
    ("net/http/persistent", "net-http-persistent"),
    ("sinatra/base", "sinatra"),
    ("google/protobuf", "google-protobuf"),
    ("aws-sdk-s3", "aws-sdk-s3"),
];

fn root(module: &str) -> &str {
    module.split('/').next().unwrap_or(module)
}

impl LanguagePlugin for RubyPlugin {
    fn id(&self) -> &'static str {
        "ruby"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".rb", ".rake", ".gemspec", ".ru"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = capture_modules(&REQUIRE, content);
        imports.retain(|i| !i.module.starts_with('.') && !i.module.starts_with('/'));
        imports
    }

    fn is_std_lib(&self, module: &str) -> bool {
        if ALIASES.iter().any(|(path, _)| *path == module) {
            return false;
        }
        STDLIB.contains(&root(module))
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        if let Some((_, gem)) = ALIASES.iter().find(|(path, _)| *path == module) {
            return Some(DetectedPackage::new(Ecosystem::Gem, *gem));
        }
        let name = root(module);
        if let Some((_, gem)) = ALIASES.iter().find(|(path, _)| *path == name) {
            return Some(DetectedPackage::new(Ecosystem::Gem, *gem));
        }
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return None;
        }
        Some(DetectedPackage::new(Ecosystem::Gem, name))
    }
}

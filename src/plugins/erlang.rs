use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

pub struct ErlangPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^-module\(\w+\)\.", 35),
        (r"(?m)^-export\(\[", 20),
        (r"(?m)^-(behaviou?r|include_lib|include|record|define|spec)\(", 15),
        (r"(?m)^\w+\([^)]*\)\s*(when\s+.+)?->", 15),
        (r"\bio:format\(", 5),
        (r"(?m)\.\s*$", 5),
    ])
});

static INCLUDE_LIB: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"(?m)^-include_lib\(\s*"([^"]+)"\s*\)"#));
static BEHAVIOUR: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?m)^-behaviou?r\(\s*(\w+)\s*\)"));

/// Applications shipped with Erlang/OTP.
const OTP_APPS: &[&str] = &[
    "kernel", "stdlib", "sasl", "crypto", "ssl", "inets", "public_key", "mnesia", "eunit",
    "common_test", "os_mon", "runtime_tools", "tools", "xmerl", "syntax_tools", "compiler",
    "asn1", "observer", "debugger", "edoc", "erts", "parsetools", "reltool", "snmp", "ssh",
    "wx", "et", "ftp", "tftp", "megaco", "odbc", "diameter", "eldap",
];

/// Behaviours defined by OTP itself.
const OTP_BEHAVIOURS: &[&str] = &["gen_server", "gen_statem", "gen_event", "gen_fsm", "supervisor", "supervisor_bridge", "application"];

/// Behaviour and module prefixes of common Hex packages.
const KNOWN: &[(&str, &str)] = &[
    ("cowboy", "cowboy"),
    ("ranch", "ranch"),
    ("jsx", "jsx"),
    ("jiffy", "jiffy"),
    ("lager", "lager"),
    ("hackney", "hackney"),
    ("gun", "gun"),
    ("poolboy", "poolboy"),
    ("recon", "recon"),
    ("meck", "meck"),
    ("proper", "proper"),
    ("cowlib", "cowlib"),
    ("gproc", "gproc"),
    ("telemetry", "telemetry"),
    ("elli", "elli"),
];

fn app_name(module: &str) -> &str {
    module.split('/').next().unwrap_or(module)
}

impl LanguagePlugin for ErlangPlugin {
    fn id(&self) -> &'static str {
        "erlang"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".erl", ".hrl", ".escript"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    /// `-include_lib` paths and `-behaviour` names; plain `-include` is local.
    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = super::capture_modules(&INCLUDE_LIB, content);
        imports.extend(super::capture_modules(&BEHAVIOUR, content));
        imports
    }

    fn is_std_lib(&self, module: &str) -> bool {
        OTP_APPS.contains(&app_name(module)) || OTP_BEHAVIOURS.contains(&module)
    }

    /// An `include_lib` path names its application directly. Behaviours are
    /// only mapped when their prefix is a known package.
    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        if module.contains('/') {
            return Some(DetectedPackage::new(Ecosystem::Hex, app_name(module)));
        }
        KNOWN
            .iter()
            .find(|(prefix, _)| module == *prefix || module.starts_with(&format!("{}_", prefix)))
            .map(|(_, package)| DetectedPackage::new(Ecosystem::Hex, *package))
    }
}

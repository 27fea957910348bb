use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// Free Pascal and Delphi units.
pub struct PascalPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?mi)^\s*(program|unit|library)\s+[\w.]+\s*;", 25),
        (r"(?mi)^\s*uses\b", 20),
        (r"(?mi)^\s*end\.\s*$", 20),
        (r"(?mi)^\s*(procedure|function)\s+[\w.]+\s*(\(.*\))?\s*(:\s*\w+)?\s*;", 15),
        (r"(?mi)^\s*(interface|implementation)\s*$", 15),
        (r"(?mi)^\s*begin\s*$", 10),
        (r"\{\$(mode|H\+|I\s)", 10),
    ])
});

static USES: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?mis)^\s*uses\s+([^;]+);"));
static IN_CLAUSE: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?is)\s+in\s+'[^']*'"));
static COMMENT: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?s)\{[^}]*\}|//[^\n]*"));

const STD_UNITS: &[&str] = &[
    "system", "sysutils", "classes", "math", "strutils", "dateutils", "types", "variants",
    "forms", "controls", "graphics", "dialogs", "stdctrls", "extctrls", "comctrls", "menus",
    "windows", "messages", "fgl", "inifiles", "contnrs", "syncobjs", "typinfo", "rtti",
    "ioutils", "character", "crt", "dos", "objects", "process", "fpjson", "jsonparser",
    "sqldb", "db", "fphttpclient", "opensslsockets", "lcltype", "lclintf", "interfaces",
    "cthreads", "cmem", "baseunix", "unix", "zstream", "base64", "regexpr", "generics.collections",
    "generics.defaults",
];

/// Namespaced RTL/VCL/FMX units.
const STD_NAMESPACES: &[&str] = &["system.", "vcl.", "fmx.", "winapi.", "data.", "xml.", "web.", "soap.", "rest."];

/// Units of common third-party libraries.
const KNOWN: &[(&str, &str)] = &[
    ("idhttp", "indy"),
    ("idtcpclient", "indy"),
    ("idsslopenssl", "indy"),
    ("syncommons", "mormot"),
    ("superobject", "superobject"),
    ("zconnection", "zeoslib"),
    ("zdataset", "zeoslib"),
    ("httpsend", "synapse"),
    ("blcksock", "synapse"),
    ("bgrabitmap", "bgrabitmap"),
    ("dunitx.testframework", "dunitx"),
    ("jclsysutils", "jcl"),
];

impl LanguagePlugin for PascalPlugin {
    fn id(&self) -> &'static str {
        "pascal"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".pas", ".pp", ".dpr", ".lpr", ".dpk"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    /// Each `uses` clause lists units up to the terminating `;`, possibly over
    /// several lines with comments and `in 'path'` suffixes.
    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = Vec::new();
        for clause in super::capture_modules(&USES, content) {
            let mut text = clause.module;
            for re in [&*COMMENT, &*IN_CLAUSE].into_iter().flatten() {
                text = re.replace_all(&text, "").into_owned();
            }
            imports.extend(
                text.split(',')
                    .map(str::trim)
                    .filter(|unit| !unit.is_empty())
                    .map(ImportEntry::new),
            );
        }
        imports
    }

    fn is_std_lib(&self, module: &str) -> bool {
        let lower = module.to_lowercase();
        STD_UNITS.contains(&lower.as_str()) || STD_NAMESPACES.iter().any(|ns| lower.starts_with(ns))
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        KNOWN
            .iter()
            .find(|(unit, _)| unit.eq_ignore_ascii_case(module))
            .map(|(_, package)| DetectedPackage::new(Ecosystem::Generic, *package))
    }
}

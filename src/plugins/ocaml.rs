use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

pub struct OcamlPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*open!?\s+[A-Z][\w.]*\s*$", 20),
        (r"(?m)^\s*let\s+(rec\s+)?\w+(\s+\w+)*\s*=", 15),
        (r"(?m)^\s*let\s+\(\)\s*=", 20),
        (r"\bmatch\s+.+\s+with\b", 15),
        (r"(?m)^\s*\|\s*[A-Z]\w*(\s+\w+)?\s*->", 10),
        (r"\(\*.*\*\)", 10),
        (r";;", 10),
        (r"(?m)^\s*module\s+[A-Z]\w*\s*=\s*(struct|[A-Z])", 10),
    ])
});

static OPEN: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r"(?m)(?:^\s*|\blet\s+)(?:open|include)!?\s+([A-Z][\w.]*)"));

const STDLIB: &[&str] = &[
    "Stdlib", "List", "Array", "String", "Printf", "Format", "Hashtbl", "Map", "Set", "Buffer",
    "Bytes", "Char", "Int", "Float", "Option", "Result", "Seq", "Sys", "Unix", "Str", "Filename",
    "Fun", "Queue", "Stack", "Lazy", "Lexing", "Parsing", "Random", "Scanf", "Arg", "Printexc",
    "Gc", "Obj", "Thread", "Mutex", "Condition", "Domain", "Effect", "Atomic", "In_channel",
    "Out_channel", "Bigarray", "Complex", "Int32", "Int64", "Nativeint", "Bool", "Uchar",
    "Either", "Weak", "Ephemeron", "Oo", "Marshal", "Digest", "Dynlink", "Unit",
];

/// Top-level modules and the opam package that provides them.
const KNOWN: &[(&str, &str)] = &[
    ("Core", "core"),
    ("Core_kernel", "core_kernel"),
    ("Core_unix", "core_unix"),
    ("Base", "base"),
    ("Stdio", "stdio"),
    ("Async", "async"),
    ("Lwt", "lwt"),
    ("Lwt_unix", "lwt"),
    ("Lwt_main", "lwt"),
    ("Yojson", "yojson"),
    ("Cmdliner", "cmdliner"),
    ("Cohttp", "cohttp"),
    ("Cohttp_lwt_unix", "cohttp-lwt-unix"),
    ("Dream", "dream"),
    ("Alcotest", "alcotest"),
    ("Fmt", "fmt"),
    ("Logs", "logs"),
    ("Re", "re"),
    ("Sexplib", "sexplib"),
    ("Angstrom", "angstrom"),
    ("Eio", "eio"),
    ("Eio_main", "eio_main"),
    ("Uri", "uri"),
    ("Zarith", "zarith"),
    ("Containers", "containers"),
    ("Sqlite3", "sqlite3"),
    ("Caqti", "caqti"),
    ("OUnit2", "ounit2"),
    ("Ppx_deriving", "ppx_deriving"),
    ("Ptime", "ptime"),
];

fn root(module: &str) -> &str {
    module.split('.').next().unwrap_or(module)
}

impl LanguagePlugin for OcamlPlugin {
    fn id(&self) -> &'static str {
        "ocaml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".ml", ".mli"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        super::capture_modules(&OPEN, content)
    }

    fn is_std_lib(&self, module: &str) -> bool {
        STDLIB.contains(&root(module))
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        let root = root(module);
        KNOWN
            .iter()
            .find(|(name, _)| *name == root)
            .map(|(_, package)| DetectedPackage::new(Ecosystem::Opam, *package))
    }
}

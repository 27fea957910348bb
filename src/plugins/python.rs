use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// Python sources. Maps top-level import names to PyPI distributions.
pub struct PythonPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*def\s+\w+\s*\([^)]*\)\s*(->\s*[^:]+)?:\s*(#.*)?$", 20),
        (r"(?m)^\s*from\s+[\w.]+\s+import\s+", 20),
        (r"(?m)^\s*import\s+[\w.]+(\s+as\s+\w+)?(\s*,\s*[\w.]+(\s+as\s+\w+)?)*\s*$", 15),
        (r#"(?m)^if\s+__name__\s*==\s*['"]__main__['"]\s*:"#, 25),
        (r"(?m)^\s*class\s+\w+(\([^)]*\))?\s*:\s*$", 10),
        (r"\bself\.\w+", 10),
        (r"(?m)^\s*elif\s+.+:\s*$", 10),
    ])
});

static IMPORT: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?m)^[ \t]*import[ \t]+([^#\n;]+)"));
static FROM_IMPORT: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r"(?m)^[ \t]*from[ \t]+([\w.]+)[ \t]+import\b"));

static STDLIB: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "__future__", "_thread", "abc", "aifc", "argparse", "array", "ast", "asynchat",
        "asyncio", "asyncore", "atexit", "audioop", "base64", "bdb", "binascii", "bisect",
        "builtins", "bz2", "calendar", "cgi", "cgitb", "chunk", "cmath", "cmd", "code",
        "codecs", "codeop", "collections", "colorsys", "compileall", "concurrent",
        "configparser", "contextlib", "contextvars", "copy", "copyreg", "cProfile", "crypt",
        "csv", "ctypes", "curses", "dataclasses", "datetime", "dbm", "decimal", "difflib",
        "dis", "doctest", "email", "encodings", "ensurepip", "enum", "errno", "faulthandler",
        "fcntl", "filecmp", "fileinput", "fnmatch", "fractions", "ftplib", "functools", "gc",
        "getopt", "getpass", "gettext", "glob", "graphlib", "grp", "gzip", "hashlib", "heapq",
        "hmac", "html", "http", "imaplib", "imghdr", "imp", "importlib", "inspect", "io",
        "ipaddress", "itertools", "json", "keyword", "lib2to3", "linecache", "locale",
        "logging", "lzma", "mailbox", "mailcap", "marshal", "math", "mimetypes", "mmap",
        "modulefinder", "msvcrt", "multiprocessing", "netrc", "nntplib", "numbers",
        "operator", "optparse", "os", "pathlib", "pdb", "pickle", "pickletools", "pipes",
        "pkgutil", "platform", "plistlib", "poplib", "posix", "posixpath", "pprint",
        "profile", "pstats", "pty", "pwd", "py_compile", "pyclbr", "pydoc", "queue",
        "quopri", "random", "re", "readline", "reprlib", "resource", "rlcompleter", "runpy",
        "sched", "secrets", "select", "selectors", "shelve", "shlex", "shutil", "signal",
        "site", "smtplib", "sndhdr", "socket", "socketserver", "spwd", "sqlite3", "ssl",
        "stat", "statistics", "string", "stringprep", "struct", "subprocess", "sunau",
        "symtable", "sys", "sysconfig", "syslog", "tabnanny", "tarfile", "telnetlib",
        "tempfile", "termios", "textwrap", "threading", "time", "timeit", "tkinter", "token",
        "tokenize", "tomllib", "trace", "traceback", "tracemalloc", "tty", "turtle", "types",
        "typing", "unicodedata", "unittest", "urllib", "uu", "uuid", "venv", "warnings",
        "wave", "weakref", "webbrowser", "winreg", "winsound", "wsgiref", "xdrlib", "xml",
        "xmlrpc", "zipapp", "zipfile", "zipimport", "zlib", "zoneinfo", "ntpath", "nturl2path",
        "opcode", "sre_compile", "sre_constants", "sre_parse", "genericpath",
    ]
    .into_iter()
    .collect()
});

/// Import names whose PyPI distribution is spelled differently.
const ALIASES: &[(&str, &str)] = &[
    ("cv2", "opencv-python"),
    ("PIL", "Pillow"),
    ("sklearn", "scikit-learn"),
    ("skimage", "scikit-image"),
    ("yaml", "PyYAML"),
    ("bs4", "beautifulsoup4"),
    ("dateutil", "python-dateutil"),
    ("dotenv", "python-dotenv"),
    ("jwt", "PyJWT"),
    ("Crypto", "pycryptodome"),
    ("attr", "attrs"),
    ("serial", "pyserial"),
    ("usb", "pyusb"),
    ("magic", "python-magic"),
    ("docx", "python-docx"),
    ("pptx", "python-pptx"),
    ("git", "GitPython"),
    ("OpenSSL", "pyOpenSSL"),
    ("MySQLdb", "mysqlclient"),
    ("psycopg2", "psycopg2-binary"),
    ("google.protobuf", "protobuf"),
    ("jose", "python-jose"),
    ("multipart", "python-multipart"),
    ("slugify", "python-slugify"),
    ("fitz", "PyMuPDF"),
    ("win32api", "pywin32"),
    ("zmq", "pyzmq"),
    ("Levenshtein", "python-Levenshtein"),
    ("telegram", "python-telegram-bot"),
    ("discord", "discord.py"),
];

fn top_level(module: &str) -> &str {
    module.split('.').next().unwrap_or(module)
}

impl LanguagePlugin for PythonPlugin {
    fn id(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".py", ".pyw", ".pyi"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = Vec::new();
        let statements = statements(content);

        if let Some(re) = IMPORT.as_ref() {
            for caps in re.captures_iter(&statements) {
                // `import a.b as c, d` lists several modules on one line
                for part in caps[1].split(',') {
                    let module = part.split_whitespace().next().unwrap_or("");
                    if !module.is_empty() && !module.starts_with('.') && !module.starts_with('(') {
                        imports.push(ImportEntry::new(module));
                    }
                }
            }
        }

        if let Some(re) = FROM_IMPORT.as_ref() {
            for caps in re.captures_iter(&statements) {
                let module = &caps[1];
                // Relative imports are project-internal
                if !module.starts_with('.') {
                    imports.push(ImportEntry::new(module));
                }
            }
        }

        imports
    }

    fn is_std_lib(&self, module: &str) -> bool {
        STDLIB.contains(top_level(module))
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        if module.is_empty() || module.starts_with('.') {
            return None;
        }

        if let Some((_, dist)) = ALIASES
            .iter()
            .find(|(import, _)| super::under(module, import, '.'))
        {
            return Some(DetectedPackage::new(Ecosystem::Pypi, *dist));
        }

        let root = top_level(module);
        if root.is_empty() || !root.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }
        Some(DetectedPackage::new(Ecosystem::Pypi, root.replace('_', "-")))
    }
}

/// One simple statement per line: comments stripped, `;` runs split apart.
fn statements(content: &str) -> String {
    content
        .lines()
        .flat_map(|line| line.split('#').next().unwrap_or_default().split(';'))
        .collect::<Vec<_>>()
        .join("\n")
}

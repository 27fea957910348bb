use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// Shell scripts. Besides `source`d files, package-manager install commands
/// are read as dependencies, encoded as `<tool>:<name>[@<version>]`.
pub struct BashPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"\A#!\s*\S*\b(bash|sh|zsh|ksh|dash)\b", 45),
        (r"(?m)^\s*(if|while)\s+\[\[?\s", 20),
        (r"(?m)^\s*(fi|done|esac)\s*$", 15),
        (r"(?m)^\s*(export|local|readonly)\s+\w+=", 15),
        (r"(?m)^\s*set\s+-[euxo]", 15),
        (r"(?m)^\s*\w+\s*\(\)\s*\{", 10),
        (r"\$\{\w+[:#%}]", 5),
    ])
});

static SOURCE: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?m)^\s*(?:source|\.)\s+([^\s;&|]+)"));
static INSTALL: Lazy<Option<Regex>> = Lazy::new(|| {
    pattern(r"(?m)\b(pip3?|python3?\s+-m\s+pip|npm|yarn|pnpm|gem|cargo|go|apt-get|apt|apk)\s+(?:install|i|add)\b([^\n;&|]*)")
});

/// Flags whose next token is a value, not a package.
const FLAGS_WITH_VALUE: &[&str] = &[
    "-r", "--requirement", "-c", "--constraint", "-e", "--editable", "-i", "--index-url",
    "--extra-index-url", "-t", "--target", "--registry", "--prefix", "--root", "--git",
    "--path", "--repository", "-X",
];

fn tool_name(raw: &str) -> &'static str {
    match raw {
        "npm" | "yarn" | "pnpm" => "npm",
        "gem" => "gem",
        "cargo" => "cargo",
        "go" => "go",
        "apt" | "apt-get" => "apt",
        "apk" => "apk",
        _ => "pip",
    }
}

/// Split `spec` into name and exact version using the tool's pin syntax.
fn split_spec<'a>(tool: &str, spec: &'a str) -> (&'a str, Option<&'a str>) {
    let pinned = match tool {
        "pip" => spec.split_once("=="),
        "apt" | "apk" => spec.split_once('='),
        // npm scopes start with '@', so only a later '@' separates the version.
        _ => spec.rfind('@').filter(|i| *i > 0).map(|i| (&spec[..i], &spec[i + 1..])),
    };
    match pinned {
        Some((name, version)) if !version.is_empty() => (name, Some(version)),
        Some((name, _)) => (name, None),
        None => (spec, None),
    }
}

fn install_entries(tool: &'static str, args: &str) -> Vec<ImportEntry> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let mut entries: Vec<ImportEntry> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].trim_matches(|c| c == '"' || c == '\'');
        i += 1;
        if matches!(tool, "gem" | "cargo") && (token == "-v" || token == "--version") {
            // gem install rails -v 7.1.0 / cargo install ripgrep --version 14.0.0
            if let Some(version) = tokens.get(i) {
                if let Some(last) = entries.last_mut() {
                    last.module = format!("{}@{}", last.module, version.trim_matches('"'));
                }
                i += 1;
            }
            continue;
        }
        if FLAGS_WITH_VALUE.contains(&token) {
            i += 1;
            continue;
        }
        if token.starts_with('-') || token.starts_with('.') || token.starts_with('/') || token.contains("://") {
            continue;
        }
        if tool == "pip" && (token.ends_with(".txt") || token.ends_with(".whl")) {
            continue;
        }
        let spec = if tool == "pip" {
            strip_pip_extras(token)
        } else {
            token.to_string()
        };
        entries.push(ImportEntry::new(format!("{}:{}", tool, spec)));
    }
    entries
}

/// `requests[socks]==2.31.0` -> `requests==2.31.0`; range pins keep only the name.
fn strip_pip_extras(spec: &str) -> String {
    let without_extras = match (spec.find('['), spec.find(']')) {
        (Some(open), Some(close)) if close > open => format!("{}{}", &spec[..open], &spec[close + 1..]),
        _ => spec.to_string(),
    };
    if without_extras.contains("==") {
        return without_extras;
    }
    let end = without_extras
        .find(|c| matches!(c, '>' | '<' | '~' | '!' | '='))
        .unwrap_or(without_extras.len());
    without_extras[..end].to_string()
}

impl LanguagePlugin for BashPlugin {
    fn id(&self) -> &'static str {
        "bash"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".sh", ".bash", ".zsh", ".ksh"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let joined = content.replace("\\\n", " ");
        let mut imports: Vec<ImportEntry> = super::capture_modules(&SOURCE, &joined)
            .into_iter()
            .map(|entry| ImportEntry::new(format!("source:{}", entry.module)))
            .collect();
        if let Some(re) = INSTALL.as_ref() {
            for caps in re.captures_iter(&joined) {
                let raw = caps[1].split_whitespace().next().unwrap_or_default();
                imports.extend(install_entries(tool_name(raw), &caps[2]));
            }
        }
        imports
    }

    /// Sourced scripts are part of the repository.
    fn is_std_lib(&self, module: &str) -> bool {
        module.starts_with("source:")
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        let (tool, spec) = module.split_once(':')?;
        let (name, version) = split_spec(tool, spec);
        if name.is_empty() {
            return None;
        }
        let (ecosystem, name) = match tool {
            "pip" => (Ecosystem::Pypi, name.to_string()),
            "npm" => (Ecosystem::Npm, name.to_string()),
            "gem" => (Ecosystem::Gem, name.to_string()),
            "cargo" => (Ecosystem::Cargo, name.to_string()),
            "go" => (Ecosystem::Golang, super::go::module_path(name)?),
            "apt" => (Ecosystem::Deb, name.to_string()),
            "apk" => (Ecosystem::Apk, name.to_string()),
            _ => return None,
        };
        Some(match version.filter(|v| *v != "latest") {
            Some(v) => DetectedPackage::with_version(ecosystem, name, v),
            None => DetectedPackage::new(ecosystem, name),
        })
    }
}

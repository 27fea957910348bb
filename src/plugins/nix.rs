use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// Nix expressions and flakes. nixpkgs attributes are recorded by attribute
/// path; GitHub sources as `github:<owner>/<repo>`.
pub struct NixPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*\{\s*(pkgs|lib|config|stdenv)\b.*\}\s*:\s*$", 30),
        (r"import\s+<nixpkgs>", 30),
        (r"\b(mkDerivation|mkShell|buildInputs|nativeBuildInputs)\b", 20),
        (r"(?m)^\s*inputs(\.\w+)*\s*=", 15),
        (r"\bwith\s+pkgs\s*;", 15),
        (r"(?m)^\s*let\s*$", 5),
        (r"(?m)^\s*in\s*$", 5),
    ])
});

static PKGS_ATTR: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"\bpkgs\.([A-Za-z_][\w\-]*(?:\.[A-Za-z_][\w\-]*)*)"));
static WITH_LIST: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?s)\bwith\s+pkgs\s*;\s*\[([^\]]*)\]"));
static FLAKE_URL: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r#"\burl\s*=\s*"github:([\w.\-]+/[\w.\-]+)"#));
static FETCH_GITHUB: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?s)fetchFromGitHub\s*\{([^}]*)\}"));
static OWNER: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"\bowner\s*=\s*"([^"]+)""#));
static REPO: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"\brepo\s*=\s*"([^"]+)""#));
static LIST_ITEM: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"^[A-Za-z_][\w\-]*(\.[A-Za-z_][\w\-]*)*$"));

/// Builders, fetchers and library attributes of nixpkgs rather than packages.
const BUILTINS: &[&str] = &[
    "lib", "stdenv", "mkShell", "mkShellNoCC", "fetchurl", "fetchzip", "fetchgit",
    "fetchFromGitHub", "fetchFromGitLab", "fetchpatch", "callPackage", "writeShellScriptBin",
    "writeShellScript", "writeText", "writeTextFile", "writeScriptBin", "buildEnv", "runCommand",
    "runCommandLocal", "makeWrapper", "symlinkJoin", "dockerTools", "buildGoModule",
    "buildPythonPackage", "buildNpmPackage", "rustPlatform", "system", "hostPlatform",
    "buildPlatform", "targetPlatform", "config", "overlays", "path",
];

fn first_capture(re: &Option<Regex>, text: &str) -> Option<String> {
    re.as_ref()?.captures(text).map(|caps| caps[1].to_string())
}

impl LanguagePlugin for NixPlugin {
    fn id(&self) -> &'static str {
        "nix"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".nix"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = super::capture_modules(&PKGS_ATTR, content);

        if let (Some(list), Some(item)) = (WITH_LIST.as_ref(), LIST_ITEM.as_ref()) {
            for caps in list.captures_iter(content) {
                let body: String = caps[1]
                    .lines()
                    .map(|line| line.split('#').next().unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(" ");
                imports.extend(
                    body.split_whitespace()
                        .filter(|token| item.is_match(token))
                        .map(ImportEntry::new),
                );
            }
        }

        imports.extend(
            super::capture_modules(&FLAKE_URL, content)
                .into_iter()
                .map(|entry| ImportEntry::new(format!("github:{}", entry.module))),
        );

        if let Some(fetch) = FETCH_GITHUB.as_ref() {
            for caps in fetch.captures_iter(content) {
                if let (Some(owner), Some(repo)) = (first_capture(&OWNER, &caps[1]), first_capture(&REPO, &caps[1])) {
                    imports.push(ImportEntry::new(format!("github:{}/{}", owner, repo)));
                }
            }
        }
        imports
    }

    fn is_std_lib(&self, module: &str) -> bool {
        let root = module.split('.').next().unwrap_or(module);
        BUILTINS.contains(&root)
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        if let Some(repo) = module.strip_prefix("github:") {
            return Some(DetectedPackage::new(Ecosystem::Github, repo));
        }
        if module.is_empty() || self.is_std_lib(module) {
            return None;
        }
        Some(DetectedPackage::new(Ecosystem::Nix, module))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_imports() {
        let src = r#"{
  inputs.nixpkgs.url = "github:NixOS/nixpkgs/nixos-unstable";
  inputs.utils.url = "github:numtide/flake-utils";
}
"#;
        let modules: Vec<String> = NixPlugin
            .extract_imports(src)
            .into_iter()
            .map(|i| i.module)
            .collect();
        assert_eq!(modules, vec!["github:NixOS/nixpkgs", "github:numtide/flake-utils"]);
    }

    #[test]
    fn test_extract_shell_packages() {
        let src = r#"{ pkgs ? import <nixpkgs> {} }:
pkgs.mkShell {
  buildInputs = with pkgs; [
    git
    python3Packages.requests # http
    (callPackage ./tool.nix {})
  ];
  nativeBuildInputs = [ pkgs.jq ];
  src = pkgs.fetchFromGitHub {
    owner = "tree-sitter";
    repo = "tree-sitter";
    rev = "v0.20.8";
  };
}
"#;
        let modules: Vec<String> = NixPlugin
            .extract_imports(src)
            .into_iter()
            .map(|i| i.module)
            .collect();
        assert_eq!(
            modules,
            vec![
                "mkShell",
                "jq",
                "fetchFromGitHub",
                "git",
                "python3Packages.requests",
                "github:tree-sitter/tree-sitter",
            ]
        );
    }

    #[test]
    fn test_is_std_lib() {
        assert!(NixPlugin.is_std_lib("mkShell"));
        assert!(NixPlugin.is_std_lib("lib.optionals"));
        assert!(!NixPlugin.is_std_lib("jq"));
    }

    #[test]
    fn test_map_to_package() {
        assert_eq!(NixPlugin.map_to_package("jq").unwrap().purl, "pkg:nix/jq");
        assert_eq!(
            NixPlugin.map_to_package("github:numtide/flake-utils").unwrap().purl,
            "pkg:github/numtide/flake-utils"
        );
        assert!(NixPlugin.map_to_package("stdenv").is_none());
    }

    #[test]
    fn test_detect() {
        let src = "{ pkgs ? import <nixpkgs> {} }:\n\npkgs.mkShell {\n  buildInputs = with pkgs; [ git ];\n}\n";
        assert!(NixPlugin.detect(src, "shell.nix") >= 90);
    }
}

use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// Dart and Flutter `package:` imports resolved to pub.dev packages.
pub struct DartPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r#"(?m)^\s*import\s+['"](package|dart):"#, 35),
        (r"(?m)^\s*void\s+main\s*\(", 15),
        (r"\b(final|late)\s+\w+(<[^>]*>)?\??\s+\w+\s*=", 10),
        (r"\bextends\s+(StatelessWidget|StatefulWidget|State<)", 25),
        (r"@override\b", 10),
        (r"\bFuture<[^>]+>\s+\w+\s*\([^)]*\)\s*async\b", 10),
    ])
});

static IMPORT: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r#"(?m)^\s*(?:import|export)\s+['"]((?:package|dart):[^'"]+)['"]"#));

/// Packages that ship with the Flutter SDK rather than pub.dev.
const SDK_PACKAGES: &[&str] = &["flutter", "flutter_test", "flutter_driver", "flutter_localizations", "flutter_web_plugins", "integration_test", "sky_engine"];

fn package_name(module: &str) -> Option<&str> {
    let rest = module.strip_prefix("package:")?;
    let name = rest.split('/').next()?;
    (!name.is_empty()).then_some(name)
}

impl LanguagePlugin for DartPlugin {
    fn id(&self) -> &'static str {
        "dart"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".dart"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    /// Only `package:` and `dart:` URIs; relative imports are project files.
    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        super::capture_modules(&IMPORT, content)
    }

    fn is_std_lib(&self, module: &str) -> bool {
        if module.starts_with("dart:") {
            return true;
        }
        package_name(module).is_some_and(|name| SDK_PACKAGES.contains(&name))
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        let name = package_name(module)?;
        Some(DetectedPackage::new(Ecosystem::Pub, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_imports() {
        let src = "import 'dart:async';\nimport 'package:flutter/material.dart';\nimport \"package:http/http.dart\" as http;\nimport 'src/local.dart';\nexport 'package:provider/provider.dart';\n";
        let modules: Vec<String> = DartPlugin
            .extract_imports(src)
            .into_iter()
            .map(|i| i.module)
            .collect();
        assert_eq!(
            modules,
            vec![
                "dart:async",
                "package:flutter/material.dart",
                "package:http/http.dart",
                "package:provider/provider.dart",
            ]
        );
    }

    #[test]
    fn test_is_std_lib() {
        assert!(DartPlugin.is_std_lib("dart:io"));
        assert!(DartPlugin.is_std_lib("package:flutter/widgets.dart"));
        assert!(!DartPlugin.is_std_lib("package:http/http.dart"));
    }

    #[test]
    fn test_map_to_package() {
        assert_eq!(
            DartPlugin.map_to_package("package:http/http.dart").unwrap().purl,
            "pkg:pub/http"
        );
        assert!(DartPlugin.map_to_package("dart:io").is_none());
    }

    #[test]
    fn test_detect() {
        let src = "import 'package:flutter/material.dart';\n\nclass App extends StatelessWidget {\n  @override\n  Widget build(BuildContext context) => Container();\n}\n";
        assert!(DartPlugin.detect(src, "main.dart") >= 90);
    }
}

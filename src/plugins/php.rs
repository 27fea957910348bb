use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, under, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// PHP namespaces resolved to Composer packages.
pub struct PhpPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"<\?php", 45),
        (r"(?m)^\s*namespace\s+[\w\\]+\s*;", 20),
        (r"(?m)^\s*use\s+[A-Z][\w\\]+(\s+as\s+\w+)?\s*;", 15),
        (r"\$this->\w+", 15),
        (r"\bfunction\s+\w+\s*\([^)]*\$\w+", 15),
        (r"\becho\s", 5),
    ])
});

static USE: Lazy<Option<Regex>> = Lazy::new(|| {
    pattern(r"(?m)^\s*use\s+(?:function\s+|const\s+)?\\?([A-Za-z_][\w\\]*)(?:\s+as\s+\w+)?\s*[;,{]")
});

/// Application namespaces used by common frameworks; never third-party.
const LOCAL_ROOTS: &[&str] = &["App", "Tests", "Database", "Domain", "Application", "Infrastructure", "Src"];

/// Namespace prefixes and the Composer package that provides them.
const KNOWN: &[(&str, &str)] = &[
    ("Illuminate", "laravel/framework"),
    ("Laravel\\Sanctum", "laravel/sanctum"),
    ("Laravel\\Socialite", "laravel/socialite"),
    ("GuzzleHttp\\Psr7", "guzzlehttp/psr7"),
    ("GuzzleHttp", "guzzlehttp/guzzle"),
    ("Monolog", "monolog/monolog"),
    ("PHPUnit", "phpunit/phpunit"),
    ("Doctrine\\ORM", "doctrine/orm"),
    ("Doctrine\\DBAL", "doctrine/dbal"),
    ("Doctrine\\Common\\Collections", "doctrine/collections"),
    ("Carbon", "nesbot/carbon"),
    ("Psr\\Log", "psr/log"),
    ("Psr\\Http\\Message", "psr/http-message"),
    ("Psr\\Container", "psr/container"),
    ("Psr\\SimpleCache", "psr/simple-cache"),
    ("Ramsey\\Uuid", "ramsey/uuid"),
    ("Twig", "twig/twig"),
    ("League\\Flysystem", "league/flysystem"),
    ("Firebase\\JWT", "firebase/php-jwt"),
    ("PhpParser", "nikic/php-parser"),
    ("Dotenv", "vlucas/phpdotenv"),
    ("Mockery", "mockery/mockery"),
    ("Faker", "fakerphp/faker"),
    ("Stripe", "stripe/stripe-php"),
    ("Aws", "aws/aws-sdk-php"),
    ("PHPMailer\\PHPMailer", "phpmailer/phpmailer"),
    ("Slim", "slim/slim"),
];

fn kebab(segment: &str) -> String {
    let mut out = String::new();
    for (i, c) in segment.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

impl LanguagePlugin for PhpPlugin {
    fn id(&self) -> &'static str {
        "php"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".php", ".phtml", ".php8"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        super::capture_modules(&USE, content)
    }

    /// Global classes (`use DateTime;`) and PHP extension namespaces.
    fn is_std_lib(&self, module: &str) -> bool {
        !module.contains('\\') || under(module, "Random", '\\') || under(module, "FFI", '\\')
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        if let Some((_, package)) = KNOWN.iter().find(|(prefix, _)| under(module, prefix, '\\')) {
            return Some(DetectedPackage::new(Ecosystem::Composer, *package));
        }

        let mut parts = module.split('\\');
        let vendor = parts.next()?;
        if LOCAL_ROOTS.contains(&vendor) {
            return None;
        }
        // Symfony\Component\HttpFoundation -> symfony/http-foundation
        if vendor == "Symfony" {
            let kind = parts.next()?;
            let name = parts.next()?;
            return match kind {
                "Component" | "Bundle" | "Bridge" => Some(DetectedPackage::new(
                    Ecosystem::Composer,
                    format!("symfony/{}", kebab(name)),
                )),
                _ => None,
            };
        }
        let package = parts.next()?;
        Some(DetectedPackage::new(
            Ecosystem::Composer,
            format!("{}/{}", kebab(vendor), kebab(package)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_imports() {
        let src = "<?php\nnamespace App\\Http;\n\nuse Illuminate\\Support\\Facades\\Route;\nuse \\DateTime;\nuse GuzzleHttp\\Client as Http;\nuse function Acme\\Util\\helper;\n";
        let modules: Vec<String> = PhpPlugin
            .extract_imports(src)
            .into_iter()
            .map(|i| i.module)
            .collect();
        assert_eq!(
            modules,
            vec![
                "Illuminate\\Support\\Facades\\Route",
                "DateTime",
                "GuzzleHttp\\Client",
                "Acme\\Util\\helper",
            ]
        );
    }

    #[test]
    fn test_is_std_lib() {
        assert!(PhpPlugin.is_std_lib("DateTime"));
        assert!(!PhpPlugin.is_std_lib("GuzzleHttp\\Client"));
    }

    #[test]
    fn test_map_to_package() {
        assert_eq!(
            PhpPlugin.map_to_package("Illuminate\\Support\\Facades\\Route").unwrap().purl,
            "pkg:composer/laravel/framework"
        );
        assert_eq!(
            PhpPlugin
                .map_to_package("Symfony\\Component\\HttpFoundation\\Request")
                .unwrap()
                .name,
            "symfony/http-foundation"
        );
        assert_eq!(
            PhpPlugin.map_to_package("Acme\\Util\\helper").unwrap().name,
            "acme/util"
        );
        assert!(PhpPlugin.map_to_package("App\\Models\\User").is_none());
    }

    #[test]
    fn test_detect() {
        let src = "<?php\n\nnamespace App;\n\nuse DateTime;\n\nclass Clock {\n    public function now($tz) { return $this->tz; }\n}\n";
        assert!(PhpPlugin.detect(src, "Clock.php") >= 90);
    }
}

use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// Terraform/OpenTofu provider and module sources.
pub struct TerraformPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r#"(?m)^\s*(resource|data)\s+"\w+"\s+"[\w-]+"\s*\{"#, 35),
        (r#"(?m)^\s*(module|variable|output|provider)\s+"[\w-]+"\s*\{"#, 25),
        (r"(?m)^\s*terraform\s*\{", 25),
        (r"(?m)^\s*required_providers\s*\{", 15),
        (r"\$\{(var|local|module|data)\.", 10),
    ])
});

static SOURCE: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"(?m)^\s*source\s*=\s*"([^"]+)""#));

fn is_local(source: &str) -> bool {
    source.starts_with("./") || source.starts_with("../") || source.starts_with('/')
}

fn is_remote(source: &str) -> bool {
    source.contains("::") || source.starts_with("git@") || source.contains("://")
}

impl LanguagePlugin for TerraformPlugin {
    fn id(&self) -> &'static str {
        "terraform"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".tf", ".tofu", ".hcl"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        super::capture_modules(&SOURCE, content)
    }

    /// Local module paths are part of the configuration itself.
    fn is_std_lib(&self, module: &str) -> bool {
        is_local(module)
    }

    /// Providers have two segments (`hashicorp/aws`), registry modules three
    /// (`terraform-aws-modules/vpc/aws`). A leading registry host is kept.
    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        if is_local(module) || is_remote(module) {
            return None;
        }
        let path = module.split("//").next().unwrap_or(module);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let bare = match segments.first() {
            Some(first) if first.contains('.') => &segments[1..],
            _ => &segments[..],
        };
        match bare.len() {
            2 | 3 => Some(DetectedPackage::new(Ecosystem::Terraform, segments.join("/"))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_imports() {
        let src = r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 5.0"
    }
  }
}

module "vpc" {
  source = "terraform-aws-modules/vpc/aws"
}

module "local" {
  source = "./modules/network"
}
"#;
        let modules: Vec<String> = TerraformPlugin
            .extract_imports(src)
            .into_iter()
            .map(|i| i.module)
            .collect();
        assert_eq!(
            modules,
            vec!["hashicorp/aws", "terraform-aws-modules/vpc/aws", "./modules/network"]
        );
    }

    #[test]
    fn test_is_std_lib() {
        assert!(TerraformPlugin.is_std_lib("../shared"));
        assert!(!TerraformPlugin.is_std_lib("hashicorp/aws"));
    }

    #[test]
    fn test_map_to_package() {
        assert_eq!(
            TerraformPlugin.map_to_package("hashicorp/aws").unwrap().purl,
            "pkg:terraform/hashicorp/aws"
        );
        assert_eq!(
            TerraformPlugin
                .map_to_package("terraform-aws-modules/vpc/aws//modules/endpoints")
                .unwrap()
                .name,
            "terraform-aws-modules/vpc/aws"
        );
        assert_eq!(
            TerraformPlugin.map_to_package("app.terraform.io/acme/network/aws").unwrap().name,
            "app.terraform.io/acme/network/aws"
        );
        assert!(TerraformPlugin.map_to_package("git::https://example.com/vpc.git").is_none());
    }

    #[test]
    fn test_detect() {
        let src = "terraform {\n  required_providers {}\n}\n\nresource \"aws_s3_bucket\" \"logs\" {\n  bucket = \"logs\"\n}\n";
        assert!(TerraformPlugin.detect(src, "main.tf") >= 90);
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

const MIB: usize = 1024 * 1024;

/// Root configuration structure, deserialized from `.repo-sbom/config.toml`.
///
/// Every section and field is optional; anything missing takes the built-in
/// default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub lockfile: LockfileConfig,
    pub enrichment: EnrichmentConfig,
    pub spdx: SpdxConfig,
}

/// Limits for the import scanner.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Source files considered per scan; the rest are counted, not fetched.
    pub max_source_files: usize,
    /// Concurrent fetches per batch.
    pub fetch_batch_size: usize,
    /// Files larger than this are skipped.
    pub max_file_bytes: usize,
    /// Cumulative fetch budget per scan.
    pub max_total_bytes: usize,
    /// Global deadline for the fetch phase.
    pub timeout_secs: u64,
    /// Minimum winning detection score for a file to count as a language.
    pub min_language_confidence: u8,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_source_files: 500,
            fetch_batch_size: 10,
            max_file_bytes: MIB,
            max_total_bytes: 50 * MIB,
            timeout_secs: 120,
            min_language_confidence: crate::plugins::MIN_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockfileConfig {
    pub max_lockfile_bytes: usize,
}

impl Default for LockfileConfig {
    fn default() -> Self {
        Self {
            max_lockfile_bytes: 10 * MIB,
        }
    }
}

/// Registry endpoints and pacing for hash enrichment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub batch_size: usize,
    /// Pause between batches; not applied after the last one.
    pub batch_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub npm_registry_url: String,
    pub pypi_url: String,
    pub user_agent: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay_ms: 500,
            request_timeout_secs: 10,
            npm_registry_url: "https://registry.npmjs.org".to_string(),
            pypi_url: "https://pypi.org".to_string(),
            user_agent: format!("repo-sbom/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpdxConfig {
    /// Prefix of every `documentNamespace`.
    pub namespace_base: String,
    /// Tool name recorded in `creationInfo.creators`.
    pub tool_name: String,
}

impl Default for SpdxConfig {
    fn default() -> Self {
        Self {
            namespace_base: "https://spdx.org/spdxdocs/repo-sbom".to_string(),
            tool_name: "repo-sbom".to_string(),
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` (path passed via `--config`)
/// 2. `<project_path>/.repo-sbom/config.toml`
/// 3. `~/.config/repo-sbom/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".repo-sbom").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("repo-sbom").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.scan.max_source_files, 500);
        assert_eq!(cfg.scan.fetch_batch_size, 10);
        assert_eq!(cfg.scan.max_file_bytes, 1024 * 1024);
        assert_eq!(cfg.scan.max_total_bytes, 50 * 1024 * 1024);
        assert_eq!(cfg.scan.timeout_secs, 120);
        assert_eq!(cfg.scan.min_language_confidence, 40);
        assert_eq!(cfg.lockfile.max_lockfile_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.enrichment.batch_size, 10);
        assert_eq!(cfg.enrichment.batch_delay_ms, 500);
        assert_eq!(cfg.enrichment.request_timeout_secs, 10);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "[scan]\nmax_source_files = 50\n\n[enrichment]\nbatch_delay_ms = 0").unwrap();

        let cfg = load_config(Path::new("/nonexistent"), Some(f.path())).unwrap();
        assert_eq!(cfg.scan.max_source_files, 50);
        assert_eq!(cfg.scan.fetch_batch_size, 10);
        assert_eq!(cfg.enrichment.batch_delay_ms, 0);
        assert_eq!(cfg.enrichment.npm_registry_url, "https://registry.npmjs.org");
        assert_eq!(cfg.spdx.tool_name, "repo-sbom");
    }

    #[test]
    fn test_project_config_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".repo-sbom")).unwrap();
        std::fs::write(
            dir.path().join(".repo-sbom").join("config.toml"),
            "[spdx]\nnamespace_base = \"https://sbom.example.com\"\n",
        )
        .unwrap();

        let cfg = load_config(dir.path(), None).unwrap();
        assert_eq!(cfg.spdx.namespace_base, "https://sbom.example.com");
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "[scan\nbroken").unwrap();
        let err = load_config(Path::new("."), Some(f.path())).unwrap_err();
        assert!(err.to_string().contains(&f.path().display().to_string()));
    }

    #[test]
    fn test_missing_override_names_the_file() {
        let err = load_config(Path::new("."), Some(Path::new("/nonexistent/repo-sbom.toml"))).unwrap_err();
        assert_eq!(err.to_string(), "reading config /nonexistent/repo-sbom.toml");
    }
}

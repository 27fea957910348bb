//! Repository access.
//!
//! Discovery only needs two capabilities from a repository host: list every
//! file path on a branch, and fetch one file's text. Hosted adapters (GitHub,
//! Gitea, GitLab, ...) implement [`RepoProvider`] outside this crate; a local
//! checkout and an in-memory map are provided here.

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, ScanError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Github,
    Gitea,
    Forgejo,
    Gitlab,
    Codeberg,
    Local,
}

/// Identifies one branch of one repository on one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoRef {
    pub provider: ProviderKind,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Base URL for self-hosted instances.
    pub instance_url: Option<String>,
    /// Canonical browse URL, used as the SBOM root's download location.
    pub url: String,
}

impl RepoRef {
    pub fn local(owner: impl Into<String>, repo: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Local,
            owner: owner.into(),
            repo: repo.into(),
            branch: "HEAD".to_string(),
            token: None,
            instance_url: None,
            url: url.into(),
        }
    }
}

#[async_trait]
pub trait RepoProvider: Send + Sync {
    /// Every file path in the repository, `/`-separated and relative to its root.
    async fn list_repo_files(&self, repo: &RepoRef) -> Result<Vec<String>>;

    /// The file's text, or `None` when the path does not exist.
    async fn get_file_content(&self, repo: &RepoRef, path: &str) -> Result<Option<String>>;
}

/// A repository checked out on the local filesystem.
pub struct LocalProvider {
    root: PathBuf,
}

impl LocalProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        (!escapes).then(|| self.root.join(relative))
    }
}

#[async_trait]
impl RepoProvider for LocalProvider {
    async fn list_repo_files(&self, _repo: &RepoRef) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(ScanError::Provider(format!(
                "not a directory: {}",
                self.root.display()
            )));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git");
        for entry in walker {
            let entry = entry.map_err(|e| ScanError::Provider(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                files.push(parts.join("/"));
            }
        }
        files.sort();
        debug!(root = %self.root.display(), files = files.len(), "listed local checkout");
        Ok(files)
    }

    async fn get_file_content(&self, _repo: &RepoRef, path: &str) -> Result<Option<String>> {
        let Some(full) = self.resolve(path) else {
            return Ok(None);
        };
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ScanError::Io {
                path: full.display().to_string(),
                source,
            }),
        }
    }
}

/// Files held in memory. Paths registered with [`MemoryProvider::fail_on`]
/// return a provider error when fetched; [`MemoryProvider::with_listed`]
/// paths are listed but absent.
#[derive(Default)]
pub struct MemoryProvider {
    files: HashMap<String, String>,
    failing: HashSet<String>,
    listed: HashSet<String>,
    fail_listing: bool,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn fail_on(mut self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }

    /// List `path` without serving it, as when a file vanishes between
    /// listing and fetching.
    pub fn with_listed(mut self, path: impl Into<String>) -> Self {
        self.listed.insert(path.into());
        self
    }

    pub fn fail_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }
}

#[async_trait]
impl RepoProvider for MemoryProvider {
    async fn list_repo_files(&self, repo: &RepoRef) -> Result<Vec<String>> {
        if self.fail_listing {
            return Err(ScanError::Provider(format!(
                "listing {}/{} failed",
                repo.owner, repo.repo
            )));
        }
        let mut paths: Vec<String> = self
            .files
            .keys()
            .chain(self.failing.iter())
            .chain(self.listed.iter())
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        paths.sort();
        Ok(paths)
    }

    async fn get_file_content(&self, _repo: &RepoRef, path: &str) -> Result<Option<String>> {
        if self.failing.contains(path) {
            return Err(ScanError::Provider(format!("fetch of {} failed", path)));
        }
        Ok(self.files.get(path).cloned())
    }
}

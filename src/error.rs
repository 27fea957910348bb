//! Error types for the discovery pipeline and the enrichment worker.
//!
//! Most failures inside this crate are recovered locally (skipped file, next
//! lockfile candidate, gap reason). [`ScanError`] is what crosses a module
//! boundary when something could not be recovered at that level.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The repository provider failed to list or fetch.
    #[error("provider error: {0}")]
    Provider(String),

    /// A lockfile was present but could not be parsed.
    #[error("lockfile parse error: {file}: {reason}")]
    LockfileParse { file: String, reason: String },

    #[error("file too large: {path}: {size} bytes (max: {max})")]
    FileTooBig { path: String, size: usize, max: usize },

    #[error("registry error for '{registry}': {source}")]
    Registry {
        registry: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("registry '{registry}' answered with status {status}")]
    RegistryStatus { registry: String, status: u16 },

    #[error("store error: {0}")]
    Store(String),

    #[error("sbom serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ScanError>;

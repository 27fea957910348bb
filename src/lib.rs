//! `repo-sbom`: discover a repository's third-party dependencies without
//! executing any of its code, and emit them as an SPDX 2.3 SBOM.
//!
//! # Flow
//! 1. A [`provider::RepoProvider`] lists files and serves their text.
//! 2. Tier 2 ([`lockfile`]) tries known lockfiles in priority order; the
//!    first one that yields dependencies wins.
//! 3. Otherwise Tier 3 ([`scanner`]) fetches source files, picks a
//!    [`plugins::LanguagePlugin`] per file and maps imports to packages.
//! 4. [`spdx::build_document`] assembles the SBOM.
//! 5. Later, [`enrichment`] back-fills artifact hashes through a
//!    [`store::DependencyStore`] and a [`registry::HashSource`].
//!
//! [`pipeline::generate_sbom`] ties steps 2 to 4 together.

pub mod config;
pub mod enrichment;
pub mod error;
pub mod lockfile;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod plugins;
pub mod provider;
pub mod purl;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod spdx;
pub mod store;

pub use error::{Result, ScanError};
pub use pipeline::{generate_sbom, SbomOutcome, TierSelection};

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use repo_sbom::pipeline::TierSelection;

#[derive(Parser, Debug)]
#[command(
    name = "repo-sbom",
    about = "Discover repository dependencies without running code and emit SPDX SBOMs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file [default: ./.repo-sbom/config.toml, fallback ~/.config/repo-sbom/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Only print summary line
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an SBOM for a local checkout
    Scan(ScanArgs),
    /// Back-fill artifact hashes for a product in a store file
    Enrich(EnrichArgs),
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Repository path to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Repository owner recorded in the SBOM [default: parent directory name]
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name recorded in the SBOM [default: directory name]
    #[arg(long)]
    pub repo: Option<String>,

    /// Branch recorded as the root package version
    #[arg(long, default_value = "HEAD")]
    pub branch: String,

    /// Download location of the root package [default: file:// URL of PATH]
    #[arg(long)]
    pub url: Option<String>,

    /// Which discovery tiers to run
    #[arg(long, default_value = "auto", value_name = "TIER")]
    pub tier: TierArg,

    /// Write the SPDX JSON document to FILE
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Also record the discovered dependencies in a store file
    #[arg(long, value_name = "STORE", requires = "product")]
    pub store: Option<PathBuf>,

    /// Product id used with --store
    #[arg(long, value_name = "ID")]
    pub product: Option<String>,
}

#[derive(Args, Debug)]
pub struct EnrichArgs {
    /// Store file (JSON) holding the product's dependencies
    pub store: PathBuf,

    /// Product id to enrich
    #[arg(long, value_name = "ID")]
    pub product: String,

    /// Write the enriched store here instead of back to STORE
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum TierArg {
    Auto,
    Lockfile,
    Imports,
}

impl From<TierArg> for TierSelection {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::Auto => TierSelection::Auto,
            TierArg::Lockfile => TierSelection::Lockfile,
            TierArg::Imports => TierSelection::Imports,
        }
    }
}

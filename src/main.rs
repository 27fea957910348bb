//! `repo-sbom` command line.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and install logging.
//! 2. Load config ([`config::load_config`]).
//! 3. `scan`: run the tier pipeline over a local checkout, write the SPDX
//!    document, optionally record the dependencies in a store file.
//! 4. `enrich`: back-fill hashes for one product of a store file.
//! 5. Render the requested report. Exit `0` even when no SBOM was derivable.

mod cli;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use repo_sbom::config::{load_config, Config};
use repo_sbom::enrichment::enrich_product;
use repo_sbom::pipeline::{generate_sbom, SbomOutcome};
use repo_sbom::provider::{LocalProvider, RepoRef};
use repo_sbom::registry::RegistryClient;
use repo_sbom::report::{self, SbomSummary};
use repo_sbom::store::MemoryStore;

use cli::{Cli, Command, EnrichArgs, ReportFormat, ScanArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    repo_sbom::logging::init(cli.quiet);

    match cli.command {
        Command::Scan(args) => scan(args, cli.config.as_deref(), cli.quiet).await,
        Command::Enrich(args) => enrich(args, cli.config.as_deref(), cli.quiet).await,
    }
}

async fn scan(args: ScanArgs, config_override: Option<&Path>, quiet: bool) -> Result<()> {
    let path = args.path.canonicalize().unwrap_or_else(|_| args.path.clone());
    let config = load_config(&path, config_override)?;
    let repo = repo_ref(&path, &args);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let spinner = spinner(quiet, format!("scanning {}/{}", repo.owner, repo.repo))?;
    let provider = LocalProvider::new(&path);
    let outcome = generate_sbom(&provider, &repo, &config, args.tier.into(), Some(&cancel)).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match (outcome.document(), &args.output) {
        (Some(document), Some(output)) => {
            let json = serde_json::to_string_pretty(document)?;
            std::fs::write(output, json).with_context(|| format!("writing {}", output.display()))?;
            if !quiet {
                eprintln!("  {} SPDX document written to {}", "→".cyan(), output.display());
            }
        }
        (None, _) => warn!(path = %path.display(), "no dependencies could be derived, no SBOM written"),
        (Some(_), None) => {}
    }

    if let (Some(store_path), Some(product)) = (&args.store, &args.product) {
        record_dependencies(store_path, product, &outcome).await?;
        if !quiet {
            eprintln!("  {} dependencies recorded for {} in {}", "→".cyan(), product, store_path.display());
        }
    }

    let summary = SbomSummary::new(&repo, &outcome);
    match args.report {
        ReportFormat::Terminal => report::terminal::render_sbom(&summary, quiet),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}

async fn enrich(args: EnrichArgs, config_override: Option<&Path>, quiet: bool) -> Result<()> {
    let config: Config = load_config(Path::new("."), config_override)?;
    let store = MemoryStore::load(&args.store)?;
    let source = RegistryClient::new(&config.enrichment)?;

    let spinner = spinner(quiet, format!("enriching {}", args.product))?;
    let result = enrich_product(&store, &source, &args.product, &config.enrichment).await;
    if let Some(pb) = spinner {
        pb.finish_with_message("Done");
    }

    let output = args.output.as_ref().unwrap_or(&args.store);
    store.save(output).await?;

    match args.report {
        ReportFormat::Terminal => report::terminal::render_enrichment(&args.product, &result, quiet),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(())
}

async fn record_dependencies(store_path: &Path, product: &str, outcome: &SbomOutcome) -> Result<()> {
    let store = MemoryStore::load(store_path)?;
    store.put_dependencies(product, outcome.enrichment_candidates()).await;
    store.save(store_path).await?;
    Ok(())
}

/// Owner and repo default to the checkout's parent and own directory names.
fn repo_ref(path: &Path, args: &ScanArgs) -> RepoRef {
    let dir_name = |p: Option<&Path>| {
        p.and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    };
    let owner = args.owner.clone().unwrap_or_else(|| dir_name(path.parent()));
    let repo = args.repo.clone().unwrap_or_else(|| dir_name(Some(path)));
    let url = args
        .url
        .clone()
        .unwrap_or_else(|| format!("file://{}", path.display()));

    let mut repo_ref = RepoRef::local(owner, repo, url);
    repo_ref.branch = args.branch.clone();
    repo_ref
}

fn spinner(quiet: bool, message: String) -> Result<Option<ProgressBar>> {
    if quiet {
        return Ok(None);
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(Some(pb))
}

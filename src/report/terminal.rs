use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::enrichment::EnrichmentResult;
use crate::models::Confidence;
use crate::report::{PackageRow, SbomSummary};

/// Render a colored terminal report of one SBOM run.
pub fn render_sbom(summary: &SbomSummary, quiet: bool) {
    if quiet {
        println!("{}", summary_line(summary));
        return;
    }

    println!("\n {} v{}", "repo-sbom".bold(), env!("CARGO_PKG_VERSION"));
    println!(" Scanning: {}/{} @ {}\n", summary.owner, summary.repo, summary.branch);

    let source = match (summary.tier, summary.lockfile_used) {
        ("lockfile", Some(file)) => format!("lockfile ({})", file),
        ("imports", _) => format!("import scan ({})", summary.languages.join(", ")),
        _ => "none".to_string(),
    };

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Source           : {}", source));
    println!(" │  {:<48} │", format!("Packages         : {}", summary.packages.len()));
    println!(
        " │  {:<48} │",
        format!("Confidence       : {}", confidence_label(summary.confidence))
    );
    if let Some(stats) = &summary.scan_stats {
        println!(
            " │  {:<48} │",
            format!("Files scanned    : {} of {}", stats.fetched, stats.source_files)
        );
        let skipped = stats.files_over_cap + stats.skipped_oversize + stats.skipped_budget;
        if skipped > 0 || stats.fetch_failed > 0 {
            println!(
                " │  {:<48} │",
                format!("{}  Skipped/failed  : {:>4} / {}", "⚠".yellow(), skipped, stats.fetch_failed)
            );
        }
        if stats.timed_out {
            println!(" │  {:<48} │", format!("{}  Stopped early (deadline)", "⚠".yellow()));
        }
    }
    println!(" └────────────────────────────────────────────────────┘\n");

    if summary.packages.is_empty() {
        println!(" {} No dependencies could be derived.\n", "[NONE]".yellow().bold());
        return;
    }

    println!(" {} Discovered dependencies:\n", "[SBOM]".green().bold());
    println!("{}", package_table(&summary.packages));
    println!();
}

/// Render the outcome of an enrichment run.
pub fn render_enrichment(product: &str, result: &EnrichmentResult, quiet: bool) {
    if quiet {
        println!(
            "Total: {}  Enriched: {}  Cached: {}  Skipped: {}  Failed: {}",
            result.total,
            result.enriched.to_string().green(),
            result.already_enriched,
            result.skipped.to_string().yellow(),
            result.failed.to_string().red(),
        );
        return;
    }

    println!("\n {} v{}", "repo-sbom".bold(), env!("CARGO_PKG_VERSION"));
    println!(" Enriching: {}\n", product);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Outcome").add_attribute(Attribute::Bold),
            Cell::new("Count").add_attribute(Attribute::Bold),
        ]);

    let gaps = &result.gaps;
    let rows = [
        ("✓ enriched", result.enriched, Color::Green),
        ("✓ already enriched", result.already_enriched, Color::Green),
        ("⚠ no version", gaps.no_version, Color::Yellow),
        ("⚠ unsupported ecosystem", gaps.unsupported_ecosystem, Color::Yellow),
        ("✗ not found", gaps.not_found, Color::Red),
        ("✗ fetch error", gaps.fetch_error, Color::Red),
    ];
    for (label, count, color) in rows {
        table.add_row(vec![
            Cell::new(label).fg(color),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("total").add_attribute(Attribute::Bold),
        Cell::new(result.total)
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
    ]);

    println!("{}\n", table);
}

pub fn summary_line(summary: &SbomSummary) -> String {
    let mut line = format!(
        "Tier: {}  Packages: {}  Confidence: {}",
        summary.tier,
        summary.packages.len(),
        confidence_label(summary.confidence)
    );
    if let Some(file) = summary.lockfile_used {
        line.push_str(&format!("  Lockfile: {}", file));
    }
    if !summary.languages.is_empty() {
        line.push_str(&format!("  Languages: {}", summary.languages.join(",")));
    }
    line
}

fn package_table(packages: &[PackageRow]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("PURL").add_attribute(Attribute::Bold),
        ]);

    for package in packages {
        let version = match &package.version {
            Some(v) => Cell::new(v),
            None => Cell::new("unknown").fg(Color::DarkGrey),
        };
        table.add_row(vec![Cell::new(&package.name), version, Cell::new(&package.purl)]);
    }
    table
}

fn confidence_label(confidence: Option<Confidence>) -> String {
    match confidence {
        Some(c) => c.to_string(),
        None => "n/a".to_string(),
    }
}

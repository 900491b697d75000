use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use barrel_fold::codebase::{CodebaseModel, FileChange, LoadProgress, Project};
use barrel_fold::config::{ConfigOverrides, ConsolidationConfig};
use barrel_fold::consolidate::{self, CanonicalResolver, ConsolidationReport, ExportScanner};
use barrel_fold::error::Result;
use barrel_fold::REGISTRY;

#[derive(Parser)]
#[command(name = "barrel-fold")]
#[command(about = "Consolidates scattered TypeScript re-exports into canonical public barrels")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Preview what would move
    barrel-fold consolidate --dry-run

    # Consolidate src/feature into src/shared/feature
    barrel-fold consolidate ./web --scope src/feature/

    # Use a different public root
    barrel-fold consolidate --public-root src/public/

    # List candidate re-exports as JSON
    barrel-fold scan --format json
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log every decision
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one consolidation pass
    Consolidate {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Path prefix of the files to consolidate
        #[arg(long)]
        scope: Option<String>,

        /// Marker replaced in originating paths
        #[arg(long)]
        source_root: Option<String>,

        /// Replacement producing canonical paths
        #[arg(long)]
        public_root: Option<String>,

        /// Configuration file (defaults to barrel-fold.toml in the project root)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the plan without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List re-exports that a pass would consider
    Scan {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Path prefix of the files to scan
        #[arg(long)]
        scope: Option<String>,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[allow(clippy::too_many_arguments)]
pub fn run_consolidate(
    path: &Path,
    scope: Option<String>,
    source_root: Option<String>,
    public_root: Option<String>,
    config: Option<&Path>,
    dry_run: bool,
    format: &str,
) -> Result<()> {
    let config = ConsolidationConfig::discover(path, config)?.apply(ConfigOverrides {
        scope,
        source_root,
        public_root,
    });
    let options = config.options(dry_run)?;

    let mut project = load_project(path, &config.ignore, format)?;
    let report = consolidate::consolidate(&mut project, &options)?;

    if format == "json" {
        let output = serde_json::to_string_pretty(&report).unwrap_or_default();
        println!("{}", output);
    } else {
        print_report(&report);
    }
    Ok(())
}

#[derive(Serialize)]
struct ScanEntry {
    file: String,
    kind: String,
    name: String,
    source: String,
    target: Option<String>,
    canonical: String,
}

pub fn run_scan(path: &Path, scope: Option<String>, format: &str) -> Result<()> {
    let config = ConsolidationConfig::discover(path, None)?;
    let scope = scope.unwrap_or_else(|| config.scope.clone());
    let project = load_project(path, &config.ignore, format)?;
    let resolver = CanonicalResolver::new(&config.source_root, &config.public_root);

    let entries: Vec<ScanEntry> = ExportScanner::new(&scope)
        .scan(&project)
        .into_iter()
        .map(|candidate| {
            let target = project
                .export_statements(candidate.file)
                .iter()
                .find(|s| s.id == candidate.statement)
                .and_then(|s| s.find(candidate.export))
                .and_then(|e| e.resolved.as_ref())
                .map(|r| project.file_path(r.file).to_string());
            ScanEntry {
                canonical: resolver.canonical_path(&candidate.path),
                file: candidate.path,
                kind: candidate.kind.to_string(),
                name: candidate.name,
                source: candidate.source,
                target,
            }
        })
        .collect();

    if format == "json" {
        let output = serde_json::to_string_pretty(&entries).unwrap_or_default();
        println!("{}", output);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No re-exports found in scope \"{}\"", scope);
        return Ok(());
    }

    println!("Re-exports ({}):", entries.len());
    for entry in &entries {
        let target = entry.target.as_deref().unwrap_or("<unresolved>");
        println!(
            "  {} [{}] {} from \"{}\" -> {} => {}",
            entry.file, entry.kind, entry.name, entry.source, target, entry.canonical
        );
    }
    Ok(())
}

fn load_project(path: &Path, ignore: &[String], format: &str) -> Result<Project> {
    debug!(
        "Supported extensions: {}",
        REGISTRY.supported_extensions().join(", ")
    );
    // Keep stdout clean for JSON consumers
    let progress = if format == "json" {
        LoadProgress::new()
    } else {
        LoadProgress::with_bar()
    };
    Project::load(path, ignore, &progress)
}

fn print_report(report: &ConsolidationReport) {
    if report.dry_run {
        println!("Dry run, nothing was written.");
    }
    println!("Consolidation:");
    println!("  Exports consolidated: {}", report.exports_consolidated);
    println!("  Imports rewritten: {}", report.usages_rewritten);
    println!("  References redirected: {}", report.references_redirected);
    println!("  Files created: {}", report.files_created);
    println!("  Files modified: {}", report.files_modified);
    println!("  Files removed: {}", report.files_removed);

    if !report.changes.is_empty() {
        println!("\n  Changes:");
        for change in &report.changes {
            let action = match change {
                FileChange::Create { .. } => "create",
                FileChange::Modify { .. } => "modify",
                FileChange::Remove { .. } => "remove",
            };
            println!("    {} {}", action, change.path());
        }
    }

    if !report.skipped.is_empty() {
        println!("\n  Skipped ({}):", report.skipped.len());
        for skipped in &report.skipped {
            match &skipped.message {
                Some(message) => println!(
                    "    {} `{}` ({}): {}",
                    skipped.file, skipped.export, skipped.reason, message
                ),
                None => println!("    {} `{}` ({})", skipped.file, skipped.export, skipped.reason),
            }
        }
    }

    if report.dry_run {
        for change in &report.changes {
            if let Some(contents) = change.contents() {
                println!("\n--- {} ---\n{}", change.path(), contents);
            }
        }
    }
}

//! The consolidation pass.
//!
//! One linear scan over the re-exports in scope. For each export every
//! fallible lookup happens first; only then are statements merged, usages
//! rewritten and the origin entry removed. A failing export is recorded as
//! skipped and the scan moves on. Once the scan is over, references that
//! still reach a removed barrel are pointed at its canonical file.

pub mod canonical;
pub mod cleanup;
pub mod merger;
pub mod report;
pub mod rewriter;
pub mod scanner;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::codebase::{CodebaseModel, ExportEntry, ExportKind, FileId, FileStatus, ImportId};
use crate::error::{ConsolidateError, Result};

pub use canonical::CanonicalResolver;
pub use merger::{MergeOutcome, MergePlan, StatementMerger};
pub use report::{ConsolidationReport, SkipReason, SkippedExport};
pub use rewriter::{ImportRewriter, PlannedRewrite, UsageLookup};
pub use scanner::{Candidate, ExportScanner};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidateOptions {
    /// Path prefix of the files whose re-exports are consolidated
    pub scope: String,
    /// Marker replaced in an originating path
    pub source_root: String,
    /// Replacement that yields the canonical path
    pub public_root: String,
    pub dry_run: bool,
}

impl Default for ConsolidateOptions {
    fn default() -> Self {
        Self {
            scope: "src/".to_string(),
            source_root: "src/".to_string(),
            public_root: "src/shared/".to_string(),
            dry_run: false,
        }
    }
}

impl ConsolidateOptions {
    pub fn validate(&self) -> Result<()> {
        if self.source_root.is_empty() {
            return Err(ConsolidateError::Config("source_root must not be empty".to_string()));
        }
        if self.public_root.is_empty() {
            return Err(ConsolidateError::Config("public_root must not be empty".to_string()));
        }
        if self.source_root == self.public_root {
            return Err(ConsolidateError::Config(format!(
                "source_root and public_root are both \"{}\"",
                self.source_root
            )));
        }
        Ok(())
    }
}

/// Lifecycle of one export during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Discovered,
    WildcardCovered,
    Merged,
    Created,
    UsagesRewritten,
    Removed,
    Skipped,
}

impl From<MergeOutcome> for ExportState {
    fn from(outcome: MergeOutcome) -> Self {
        match outcome {
            MergeOutcome::WildcardCovered(_) => ExportState::WildcardCovered,
            MergeOutcome::Merged(_) => ExportState::Merged,
            MergeOutcome::Created(_) => ExportState::Created,
        }
    }
}

/// State that lives exactly as long as one pass.
pub struct PassContext {
    pub canonical: CanonicalResolver,
    pub rewritten: HashSet<ImportId>,
    pub report: ConsolidationReport,
}

impl PassContext {
    pub fn new(options: &ConsolidateOptions) -> Self {
        Self {
            canonical: CanonicalResolver::new(&options.source_root, &options.public_root),
            rewritten: HashSet::new(),
            report: ConsolidationReport {
                dry_run: options.dry_run,
                ..Default::default()
            },
        }
    }
}

/// Runs one consolidation pass over `model` and commits it unless `dry_run` is set.
pub fn consolidate(
    model: &mut dyn CodebaseModel,
    options: &ConsolidateOptions,
) -> Result<ConsolidationReport> {
    options.validate()?;

    let candidates = ExportScanner::new(&options.scope).scan(model);
    info!(
        "Found {} re-exports in scope \"{}\"",
        candidates.len(),
        options.scope
    );

    let mut ctx = PassContext::new(options);

    for group in candidates.chunk_by(|a, b| a.file == b.file) {
        let mut removed_any = false;
        for candidate in group {
            match process_export(model, &mut ctx, candidate) {
                Ok(ExportState::Removed) => {
                    ctx.report.exports_consolidated += 1;
                    removed_any = true;
                }
                Ok(_) => {}
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping `{}` in {}: {}", candidate.name, candidate.path, e);
                    ctx.report
                        .skip(candidate, SkipReason::from_error(&e), Some(e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        if removed_any {
            cleanup::cleanup_file(model, group[0].file)?;
        }
    }

    ctx.report.references_redirected = cleanup::redirect_references(model, &ctx.canonical)?;

    let changes = model.plan()?;
    ctx.report.record_changes(changes);

    if options.dry_run {
        info!("Dry run: {} file changes not written", ctx.report.changes.len());
    } else if !ctx.report.is_noop() {
        model.commit()?;
    }

    info!(
        "Consolidated {} exports, rewrote {} imports, redirected {} references ({} created, {} modified, {} removed, {} skipped)",
        ctx.report.exports_consolidated,
        ctx.report.usages_rewritten,
        ctx.report.references_redirected,
        ctx.report.files_created,
        ctx.report.files_modified,
        ctx.report.files_removed,
        ctx.report.skipped.len()
    );
    Ok(ctx.report)
}

fn process_export(
    model: &mut dyn CodebaseModel,
    ctx: &mut PassContext,
    candidate: &Candidate,
) -> Result<ExportState> {
    let origin_path = candidate.path.clone();
    let canonical_path = ctx.canonical.canonical_path(&origin_path);
    if canonical_path == origin_path {
        debug!("`{}` in {} is already canonical", candidate.name, origin_path);
        ctx.report.skip(candidate, SkipReason::AlreadyCanonical, None);
        return Ok(ExportState::Skipped);
    }
    debug!(
        "`{}` in {}: {:?}",
        candidate.name,
        origin_path,
        ExportState::Discovered
    );

    let rewrite_failure = |e: ConsolidateError| ConsolidateError::RewriteFailure {
        file: origin_path.clone(),
        export: candidate.name.clone(),
        reason: e.to_string(),
    };

    let export = model
        .export_statements(candidate.file)
        .iter()
        .find(|s| s.id == candidate.statement)
        .and_then(|s| s.find(candidate.export))
        .cloned()
        .ok_or_else(|| ConsolidateError::RewriteFailure {
            file: origin_path.clone(),
            export: candidate.name.clone(),
            reason: "export is no longer present".to_string(),
        })?;

    let resolved = export
        .resolved
        .clone()
        .ok_or_else(|| ConsolidateError::Resolution {
            file: origin_path.clone(),
            export: candidate.name.clone(),
            reason: format!("\"{}\" does not lead to a declaration", candidate.source),
        })?;

    let targets = forwarded_modules(model, ctx, candidate.kind, resolved.file);
    if targets.is_empty() {
        return Err(ConsolidateError::Resolution {
            file: origin_path.clone(),
            export: candidate.name.clone(),
            reason: format!("\"{}\" was removed earlier in this pass", candidate.source),
        });
    }

    let canonical = ctx
        .canonical
        .resolve(model, &origin_path)
        .map_err(rewrite_failure)?;

    let entry = match candidate.kind {
        ExportKind::Wildcard => ExportEntry::wildcard(),
        ExportKind::Named | ExportKind::Type => {
            ExportEntry::new(resolved.name.clone(), export.name.clone())
        }
    };

    let mut plans = Vec::with_capacity(targets.len());
    for &target in &targets {
        let relative = model.relative_path(canonical, target);
        let plan = StatementMerger::plan(model, canonical, candidate.kind, &relative, &entry)?;
        plans.push((target, relative, plan));
    }

    let wildcard_covered = plans
        .iter()
        .any(|(_, _, plan)| matches!(plan, MergePlan::WildcardCovered { .. }));
    let lookup = match candidate.kind {
        ExportKind::Wildcard => UsageLookup::Wildcard(&targets),
        ExportKind::Named | ExportKind::Type => UsageLookup::Export(&export),
    };
    let rewrites = ImportRewriter::plan(
        model,
        &ctx.rewritten,
        candidate.file,
        lookup,
        canonical,
        wildcard_covered,
    )
    .map_err(rewrite_failure)?;

    // Everything below mutates the model
    for (target, relative, plan) in plans {
        let outcome = StatementMerger::apply(model, canonical, &relative, Some(target), plan)
            .map_err(rewrite_failure)?;
        debug!(
            "`{}` in {}: {:?}",
            candidate.name,
            origin_path,
            ExportState::from(outcome)
        );
    }

    let rewritten = ImportRewriter::apply(model, &mut ctx.rewritten, rewrites)
        .map_err(rewrite_failure)?;
    ctx.report.usages_rewritten += rewritten;
    debug!(
        "`{}` in {}: {:?} ({} imports)",
        candidate.name,
        origin_path,
        ExportState::UsagesRewritten,
        rewritten
    );

    model
        .remove_export(candidate.file, candidate.statement, candidate.export)
        .map_err(rewrite_failure)?;
    debug!(
        "`{}` in {}: {:?}",
        candidate.name,
        origin_path,
        ExportState::Removed
    );
    Ok(ExportState::Removed)
}

/// Modules the canonical statement should forward from.
///
/// A wildcard whose target was itself consolidated earlier in the pass also
/// forwards from that target's canonical file, and only from there once the
/// target is gone. Targets consolidated later are redirected after the scan.
fn forwarded_modules(
    model: &dyn CodebaseModel,
    ctx: &PassContext,
    kind: ExportKind,
    target: FileId,
) -> Vec<FileId> {
    let mut targets = Vec::new();
    if model.status(target) != FileStatus::Removed {
        targets.push(target);
    }
    if kind == ExportKind::Wildcard {
        if let Some(moved) = ctx.canonical.lookup(model.file_path(target)) {
            if moved != target && model.status(moved) != FileStatus::Removed {
                targets.push(moved);
            }
        }
    }
    targets
}

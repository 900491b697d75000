use std::fmt;

use serde::Serialize;

use crate::codebase::{ExportKind, FileChange};
use crate::consolidate::scanner::Candidate;
use crate::error::ConsolidateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyCanonical,
    Unresolved,
    MergeConflict,
    RewriteFailure,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AlreadyCanonical => "already canonical",
            SkipReason::Unresolved => "unresolved",
            SkipReason::MergeConflict => "merge conflict",
            SkipReason::RewriteFailure => "rewrite failure",
        }
    }

    pub fn from_error(error: &ConsolidateError) -> Self {
        match error {
            ConsolidateError::Resolution { .. } => SkipReason::Unresolved,
            ConsolidateError::MergeConflict { .. } => SkipReason::MergeConflict,
            _ => SkipReason::RewriteFailure,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedExport {
    pub file: String,
    pub export: String,
    pub kind: ExportKind,
    pub reason: SkipReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of one consolidation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsolidationReport {
    pub files_created: usize,
    pub files_modified: usize,
    pub files_removed: usize,
    pub exports_consolidated: usize,
    pub usages_rewritten: usize,
    /// Statements pointed away from files removed during the pass
    pub references_redirected: usize,
    pub skipped: Vec<SkippedExport>,
    pub changes: Vec<FileChange>,
    pub dry_run: bool,
}

impl ConsolidationReport {
    pub fn skip(&mut self, candidate: &Candidate, reason: SkipReason, message: Option<String>) {
        self.skipped.push(SkippedExport {
            file: candidate.path.clone(),
            export: candidate.name.clone(),
            kind: candidate.kind,
            reason,
            message,
        });
    }

    pub fn record_changes(&mut self, changes: Vec<FileChange>) {
        for change in &changes {
            match change {
                FileChange::Create { .. } => self.files_created += 1,
                FileChange::Modify { .. } => self.files_modified += 1,
                FileChange::Remove { .. } => self.files_removed += 1,
            }
        }
        self.changes = changes;
    }

    /// True when the pass produced no edits at all.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> impl Iterator<Item = &SkippedExport> {
        self.skipped.iter().filter(move |s| s.reason == reason)
    }
}

use tracing::debug;

use crate::codebase::{CodebaseModel, ExportEntry, ExportKind, FileId, StatementId};
use crate::error::{ConsolidateError, Result};

/// What the merger will do with one export in its canonical file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergePlan {
    /// A wildcard for the same path already forwards it
    WildcardCovered { statement: StatementId },
    /// The identical entry is already forwarded
    AlreadyPresent { statement: StatementId },
    Prepend {
        statement: StatementId,
        entry: ExportEntry,
    },
    Create { kind: ExportKind, entry: ExportEntry },
}

/// Result of applying a [`MergePlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    WildcardCovered(StatementId),
    Merged(StatementId),
    Created(StatementId),
}

pub struct StatementMerger;

impl StatementMerger {
    /// Decides how `entry` joins `canonical`. Never mutates the model.
    pub fn plan(
        model: &dyn CodebaseModel,
        canonical: FileId,
        kind: ExportKind,
        relative: &str,
        entry: &ExportEntry,
    ) -> Result<MergePlan> {
        let statements = model.export_statements(canonical);

        // `export *` never forwards a default export
        if entry.local_name != "default" {
            if let Some(wildcard) = statements
                .iter()
                .find(|s| s.kind == ExportKind::Wildcard && s.source.as_deref() == Some(relative))
            {
                return Ok(MergePlan::WildcardCovered {
                    statement: wildcard.id,
                });
            }
        }

        match kind {
            ExportKind::Wildcard => Ok(MergePlan::Create {
                kind,
                entry: entry.clone(),
            }),
            ExportKind::Named | ExportKind::Type => {
                for statement in statements.iter().filter(|s| s.kind != ExportKind::Wildcard) {
                    let Some(existing) = statement.exports.iter().find(|e| e.name == entry.name) else {
                        continue;
                    };
                    let identical = statement.kind == kind
                        && statement.source.as_deref() == Some(relative)
                        && !statement.declaration
                        && existing.local_name == entry.local_name;
                    if identical {
                        return Ok(MergePlan::AlreadyPresent {
                            statement: statement.id,
                        });
                    }
                    let existing = match &statement.source {
                        Some(source) if !statement.declaration => {
                            format!("a {} export of `{}` from \"{}\"", statement.kind, existing.local_name, source)
                        }
                        _ => "a local export".to_string(),
                    };
                    return Err(ConsolidateError::MergeConflict {
                        file: model.file_path(canonical).to_string(),
                        path: relative.to_string(),
                        name: entry.name.clone(),
                        existing,
                    });
                }

                let mergeable = statements.iter().find(|s| {
                    s.kind == kind && s.is_reexport() && s.source.as_deref() == Some(relative)
                });
                Ok(match mergeable {
                    Some(statement) => MergePlan::Prepend {
                        statement: statement.id,
                        entry: entry.clone(),
                    },
                    None => MergePlan::Create {
                        kind,
                        entry: entry.clone(),
                    },
                })
            }
        }
    }

    pub fn apply(
        model: &mut dyn CodebaseModel,
        canonical: FileId,
        relative: &str,
        target: Option<FileId>,
        plan: MergePlan,
    ) -> Result<MergeOutcome> {
        let outcome = match plan {
            MergePlan::WildcardCovered { statement } => MergeOutcome::WildcardCovered(statement),
            MergePlan::AlreadyPresent { statement } => MergeOutcome::Merged(statement),
            MergePlan::Prepend { statement, entry } => {
                model.prepend_export(canonical, statement, entry)?;
                MergeOutcome::Merged(statement)
            }
            MergePlan::Create { kind, entry } => {
                let statement = model.add_export_statement(canonical, kind, relative, target, vec![entry])?;
                MergeOutcome::Created(statement)
            }
        };
        debug!("{} \"{}\": {:?}", model.file_path(canonical), relative, outcome);
        Ok(outcome)
    }
}

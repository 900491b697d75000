use serde::Serialize;
use tracing::debug;

use crate::codebase::{CodebaseModel, ExportId, ExportKind, FileId, StatementId};

/// A re-export selected for consolidation.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub file: FileId,
    pub path: String,
    pub statement: StatementId,
    pub export: ExportId,
    pub kind: ExportKind,
    /// Exported name (`*` for wildcards)
    pub name: String,
    /// Module specifier as written in the origin file
    pub source: String,
}

pub struct ExportScanner {
    scope: String,
}

impl ExportScanner {
    /// `scope` is a path prefix; empty or `.` selects every file.
    pub fn new(scope: &str) -> Self {
        let scope = scope.trim_start_matches("./");
        let scope = if scope == "." { "" } else { scope };
        Self {
            scope: scope.to_string(),
        }
    }

    pub fn in_scope(&self, path: &str) -> bool {
        path.starts_with(&self.scope)
    }

    /// Snapshot of in-scope, non-external re-exports in model order.
    pub fn scan(&self, model: &dyn CodebaseModel) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for file in model.files() {
            let path = model.file_path(file);
            if !self.in_scope(path) {
                continue;
            }

            for statement in model.export_statements(file) {
                if !statement.is_reexport() {
                    continue;
                }
                let source = statement.source.clone().unwrap_or_default();
                for export in &statement.exports {
                    if export.external {
                        debug!("Skipping external re-export `{}` from \"{}\" in {}", export.name, source, path);
                        continue;
                    }
                    candidates.push(Candidate {
                        file,
                        path: path.to_string(),
                        statement: statement.id,
                        export: export.id,
                        kind: statement.kind,
                        name: export.name.clone(),
                        source: source.clone(),
                    });
                }
            }
        }

        candidates
    }
}

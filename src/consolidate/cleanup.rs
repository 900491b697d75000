use std::collections::HashSet;

use tracing::{debug, warn};

use crate::codebase::{CodebaseModel, ExportKind, FileId, FileStatus, StatementId};
use crate::consolidate::canonical::CanonicalResolver;
use crate::error::Result;

/// Deletes `file` when it has no export statements and no declarations left.
///
/// Returns whether the file was removed. References that still reach it are
/// handled by [`redirect_references`] once the scan is over.
pub fn cleanup_file(model: &mut dyn CodebaseModel, file: FileId) -> Result<bool> {
    if model.status(file) == FileStatus::Removed {
        return Ok(false);
    }
    if !model.export_statements(file).is_empty() || !model.declared_symbols(file).is_empty() {
        debug!("Keeping {}", model.file_path(file));
        return Ok(false);
    }

    model.remove_file(file)?;
    debug!("Removed empty {}", model.file_path(file));
    Ok(true)
}

enum Redirect {
    Export {
        file: FileId,
        statement: StatementId,
        source: String,
        target: FileId,
    },
    /// A wildcard the file already has for the new target
    DropWildcard {
        file: FileId,
        statement: StatementId,
    },
    Import {
        file: FileId,
        statement: StatementId,
        specifier: String,
        target: FileId,
    },
}

/// Live canonical counterpart of a file removed during the pass.
fn moved_to(model: &dyn CodebaseModel, canonical: &CanonicalResolver, removed: FileId) -> Option<FileId> {
    canonical
        .lookup(model.file_path(removed))
        .filter(|&moved| moved != removed && model.status(moved) != FileStatus::Removed)
}

/// Points every statement that still reaches a removed file at that file's
/// canonical counterpart.
///
/// A wildcard emitted before its target barrel was consolidated ends up
/// forwarding from the target's canonical file; namespace, default and
/// side-effect imports of a removed barrel import its canonical file instead.
/// Returns the number of statements changed.
pub fn redirect_references(
    model: &mut dyn CodebaseModel,
    canonical: &CanonicalResolver,
) -> Result<usize> {
    let mut redirects = Vec::new();
    let mut wildcards: HashSet<(FileId, FileId)> = HashSet::new();

    for file in model.files() {
        for statement in model.export_statements(file) {
            if statement.kind == ExportKind::Wildcard {
                if let Some(target) = statement.target {
                    wildcards.insert((file, target));
                }
            }
        }
    }

    for file in model.files() {
        for statement in model.export_statements(file) {
            let Some(removed) = statement.target else {
                continue;
            };
            if statement.declaration || model.status(removed) != FileStatus::Removed {
                continue;
            }
            let Some(moved) = moved_to(model, canonical, removed).filter(|&moved| moved != file) else {
                warn!(
                    "{} still re-exports from removed {}",
                    model.file_path(file),
                    model.file_path(removed)
                );
                continue;
            };
            if statement.kind == ExportKind::Wildcard && !wildcards.insert((file, moved)) {
                redirects.push(Redirect::DropWildcard {
                    file,
                    statement: statement.id,
                });
            } else {
                redirects.push(Redirect::Export {
                    file,
                    statement: statement.id,
                    source: model.relative_path(file, moved),
                    target: moved,
                });
            }
        }

        for import in model.import_statements(file) {
            let Some(removed) = import.target else {
                continue;
            };
            if model.status(removed) != FileStatus::Removed {
                continue;
            }
            let Some(moved) = moved_to(model, canonical, removed).filter(|&moved| moved != file) else {
                warn!(
                    "{} still imports removed {}",
                    model.file_path(file),
                    model.file_path(removed)
                );
                continue;
            };
            redirects.push(Redirect::Import {
                file,
                statement: import.id,
                specifier: model.translate_import_path(file, moved)?,
                target: moved,
            });
        }
    }

    let count = redirects.len();
    for redirect in redirects {
        match redirect {
            Redirect::Export {
                file,
                statement,
                source,
                target,
            } => model.retarget_export_statement(file, statement, &source, target)?,
            Redirect::DropWildcard { file, statement } => {
                let exports: Vec<_> = model
                    .export_statements(file)
                    .iter()
                    .find(|s| s.id == statement)
                    .map(|s| s.exports.iter().map(|e| e.id).collect())
                    .unwrap_or_default();
                for export in exports {
                    model.remove_export(file, statement, export)?;
                }
                debug!("Dropped duplicate wildcard in {}", model.file_path(file));
            }
            Redirect::Import {
                file,
                statement,
                specifier,
                target,
            } => model.retarget_import(file, statement, &specifier, target)?,
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebase::{ExportEntry, Project};
    use std::path::Path;

    fn project() -> Project {
        Project::from_sources(
            Path::new("/virtual"),
            &[
                ("src/a.ts", "export const a = 1;\n"),
                ("src/barrel.ts", "export { a } from \"./a\";\n"),
                ("src/local.ts", "const hidden = 1;\n"),
                ("src/app.ts", "import { a } from \"./barrel\";\n"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_cleanup_keeps_file_with_exports() {
        let mut project = project();
        let barrel = project.find_file("src/barrel.ts").unwrap();
        assert!(!cleanup_file(&mut project, barrel).unwrap());
        assert_eq!(project.status(barrel), FileStatus::Loaded);
    }

    #[test]
    fn test_cleanup_keeps_file_with_symbols() {
        let mut project = project();
        let local = project.find_file("src/local.ts").unwrap();
        assert!(!cleanup_file(&mut project, local).unwrap());
    }

    fn remove_first_export(project: &mut Project, file: FileId) {
        let statement = project.export_statements(file)[0].clone();
        project
            .remove_export(file, statement.id, statement.exports[0].id)
            .unwrap();
    }

    #[test]
    fn test_redirect_points_references_at_canonical_file() {
        let mut project = Project::from_sources(
            Path::new("/virtual"),
            &[
                ("src/a.ts", "export const a = 1;\n"),
                ("src/barrel.ts", "export { a } from \"./a\";\n"),
                ("src/app.ts", "import * as all from \"./barrel\";\n"),
                ("src/shared/index.ts", "export * from \"../barrel\";\n"),
            ],
        )
        .unwrap();
        let barrel = project.find_file("src/barrel.ts").unwrap();

        let mut canonical = CanonicalResolver::new("src/", "src/shared/");
        let moved = canonical.resolve(&mut project, "src/barrel.ts").unwrap();
        let a = project.find_file("src/a.ts").unwrap();
        project
            .add_export_statement(moved, ExportKind::Named, "../a", Some(a), vec![ExportEntry::new("a", "a")])
            .unwrap();
        remove_first_export(&mut project, barrel);
        assert!(cleanup_file(&mut project, barrel).unwrap());

        assert_eq!(redirect_references(&mut project, &canonical).unwrap(), 2);

        let app = project.find_file("src/app.ts").unwrap();
        assert_eq!(project.import_statements(app)[0].target, Some(moved));
        assert_eq!(project.import_statements(app)[0].specifier, "./shared/barrel");

        let index = project.find_file("src/shared/index.ts").unwrap();
        let wildcard = &project.export_statements(index)[0];
        assert_eq!(wildcard.target, Some(moved));
        assert_eq!(wildcard.source.as_deref(), Some("./barrel"));
    }

    #[test]
    fn test_redirect_drops_duplicate_wildcard() {
        let mut project = Project::from_sources(
            Path::new("/virtual"),
            &[
                ("src/a.ts", "export const a = 1;\n"),
                ("src/barrel.ts", "export { a } from \"./a\";\n"),
                ("src/shared/barrel.ts", "export { a } from \"../a\";\n"),
                ("src/shared/index.ts", "export * from \"../barrel\";\nexport * from \"./barrel\";\n"),
            ],
        )
        .unwrap();
        let barrel = project.find_file("src/barrel.ts").unwrap();
        let mut canonical = CanonicalResolver::new("src/", "src/shared/");
        canonical.resolve(&mut project, "src/barrel.ts").unwrap();
        remove_first_export(&mut project, barrel);
        cleanup_file(&mut project, barrel).unwrap();

        redirect_references(&mut project, &canonical).unwrap();

        let index = project.find_file("src/shared/index.ts").unwrap();
        let statements = project.export_statements(index);
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].source.as_deref(), Some("./barrel"));
    }

    #[test]
    fn test_redirect_without_canonical_file_leaves_reference() {
        let mut project = project();
        let barrel = project.find_file("src/barrel.ts").unwrap();
        remove_first_export(&mut project, barrel);
        cleanup_file(&mut project, barrel).unwrap();

        let canonical = CanonicalResolver::new("src/", "src/shared/");
        assert_eq!(redirect_references(&mut project, &canonical).unwrap(), 0);
    }

    #[test]
    fn test_cleanup_removes_emptied_file() {
        let mut project = project();
        let barrel = project.find_file("src/barrel.ts").unwrap();
        let statement = project.export_statements(barrel)[0].clone();
        project
            .remove_export(barrel, statement.id, statement.exports[0].id)
            .unwrap();

        assert!(cleanup_file(&mut project, barrel).unwrap());
        assert_eq!(project.status(barrel), FileStatus::Removed);
        assert!(!cleanup_file(&mut project, barrel).unwrap());
    }
}

use std::collections::HashSet;

use tracing::debug;

use crate::codebase::{
    CodebaseModel, Export, FileId, ImportId, ImportUsage, NewBinding, NewImport,
};
use crate::error::Result;

/// One import binding and the declaration that replaces it.
#[derive(Debug, Clone)]
pub struct PlannedRewrite {
    pub usage: ImportUsage,
    pub import: NewImport,
}

/// How consumers of an export are found.
#[derive(Debug, Clone, Copy)]
pub enum UsageLookup<'a> {
    /// Bindings naming a named or type export
    Export(&'a Export),
    /// Bindings served through a wildcard by any of the given modules
    Wildcard(&'a [FileId]),
}

pub struct ImportRewriter;

impl ImportRewriter {
    /// Computes every rewrite for one export without mutating the model.
    ///
    /// `wildcard_covered` is set when the canonical file forwards the export
    /// through `export *`, where only the original name is visible.
    pub fn plan(
        model: &dyn CodebaseModel,
        rewritten: &HashSet<ImportId>,
        origin: FileId,
        lookup: UsageLookup<'_>,
        canonical: FileId,
        wildcard_covered: bool,
    ) -> Result<Vec<PlannedRewrite>> {
        let usages = match lookup {
            UsageLookup::Export(export) => model.symbol_usages(origin, export.id)?,
            UsageLookup::Wildcard(providers) => {
                let mut seen = HashSet::new();
                let mut usages = Vec::new();
                for provider in providers {
                    for usage in model.wildcard_usages(origin, *provider)? {
                        if seen.insert(usage.binding.id) {
                            usages.push(usage);
                        }
                    }
                }
                usages
            }
        };

        let mut rewrites = Vec::with_capacity(usages.len());
        for usage in usages {
            if rewritten.contains(&usage.binding.id) {
                debug!(
                    "`{}` in {} was already rewritten",
                    usage.binding.name,
                    model.file_path(usage.file)
                );
                continue;
            }

            let specifier = model.translate_import_path(usage.file, canonical)?;
            let binding = match lookup {
                UsageLookup::Export(export) if wildcard_covered => match &export.resolved {
                    Some(resolved) if resolved.name != export.name => NewBinding {
                        name: resolved.name.clone(),
                        alias: Some(usage.binding.local_name().to_string()),
                        type_only: usage.binding.type_only,
                    },
                    _ => NewBinding::from_binding(&usage.binding),
                },
                _ => NewBinding::from_binding(&usage.binding),
            };
            let type_only = model
                .import_statements(usage.file)
                .iter()
                .find(|s| s.id == usage.statement)
                .is_some_and(|s| s.type_only);

            rewrites.push(PlannedRewrite {
                import: NewImport {
                    specifier,
                    target: Some(canonical),
                    type_only,
                    binding,
                },
                usage,
            });
        }

        Ok(rewrites)
    }

    /// Inserts each replacement before the old declaration, then drops the old binding.
    pub fn apply(
        model: &mut dyn CodebaseModel,
        rewritten: &mut HashSet<ImportId>,
        rewrites: Vec<PlannedRewrite>,
    ) -> Result<usize> {
        let mut count = 0;
        for rewrite in rewrites {
            let PlannedRewrite { usage, import } = rewrite;
            debug!(
                "Rewriting `{}` in {} to \"{}\"",
                usage.binding.local_name(),
                model.file_path(usage.file),
                import.specifier
            );
            let (_, replacement) = model.insert_import_before(usage.file, usage.statement, import)?;
            model.remove_import_binding(usage.file, usage.statement, usage.binding.id)?;

            rewritten.insert(usage.binding.id);
            rewritten.insert(replacement);
            count += 1;
        }
        Ok(count)
    }
}

//! Statement rendering and text edits.

use std::ops::Range;

use crate::codebase::types::{ExportKind, ExportStatement, ImportStatement};

pub fn render_export(statement: &ExportStatement) -> String {
    let from = statement
        .source
        .as_ref()
        .map(|s| format!(" from \"{}\"", s))
        .unwrap_or_default();

    match statement.kind {
        ExportKind::Wildcard => format!("export *{};", from),
        ExportKind::Named | ExportKind::Type => {
            let keyword = if statement.kind == ExportKind::Type {
                "export type"
            } else {
                "export"
            };
            let entries: Vec<String> = statement.exports.iter().map(|e| e.specifier()).collect();
            format!("{} {{ {} }}{};", keyword, entries.join(", "), from)
        }
    }
}

pub fn render_import(statement: &ImportStatement) -> String {
    let mut clause: Vec<String> = Vec::new();
    let default = statement.bindings.iter().position(|b| b.is_default());
    if let Some(binding) = default.map(|idx| &statement.bindings[idx]) {
        clause.push(binding.local_name().to_string());
    }
    if let Some(namespace) = &statement.namespace {
        clause.push(format!("* as {}", namespace));
    }
    let named: Vec<String> = statement
        .bindings
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != default)
        .map(|(_, b)| b.specifier())
        .collect();
    if !named.is_empty() {
        clause.push(format!("{{ {} }}", named.join(", ")));
    }

    let keyword = if statement.type_only { "import type" } else { "import" };
    if clause.is_empty() {
        format!("import \"{}\";", statement.specifier)
    } else {
        format!("{} {} from \"{}\";", keyword, clause.join(", "), statement.specifier)
    }
}

/// A pending replacement of `range` in the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub text: String,
    /// Insertion order among edits at the same offset
    pub seq: u32,
}

impl Edit {
    pub fn insert(offset: usize, text: String, seq: u32) -> Self {
        Self {
            range: offset..offset,
            text,
            seq,
        }
    }

    pub fn replace(range: Range<usize>, text: String) -> Self {
        Self {
            range,
            text,
            seq: u32::MAX,
        }
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::replace(range, String::new())
    }

    fn is_insert(&self) -> bool {
        self.range.is_empty()
    }
}

/// Applies non-overlapping edits; insertions at an offset precede a
/// replacement starting there.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then_with(|| b.is_insert().cmp(&a.is_insert()))
            .then_with(|| a.seq.cmp(&b.seq))
    });

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.range.start > cursor {
            out.push_str(&source[cursor..edit.range.start]);
        }
        out.push_str(&edit.text);
        cursor = cursor.max(edit.range.end);
    }
    if cursor < source.len() {
        out.push_str(&source[cursor..]);
    }
    out
}

/// Extends a statement span over the rest of its line when nothing else follows it.
pub fn removal_range(source: &str, span: &Range<usize>) -> Range<usize> {
    let rest = &source[span.end..];
    let trailing = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    let after = &rest[trailing..];
    if after.starts_with("\r\n") {
        span.start..span.end + trailing + 2
    } else if after.starts_with('\n') {
        span.start..span.end + trailing + 1
    } else if after.is_empty() {
        span.start..source.len()
    } else {
        span.clone()
    }
}

/// Offset of the start of the line following `pos`, or the end of the text.
pub fn line_start_after(source: &str, pos: usize) -> usize {
    match source[pos..].find('\n') {
        Some(idx) => pos + idx + 1,
        None => source.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebase::types::{
        Export, ExportId, FileId, ImportBinding, ImportId, Placement, StatementId,
    };

    fn export(name: &str, local: &str) -> Export {
        Export {
            id: ExportId(0),
            name: name.to_string(),
            local_name: local.to_string(),
            kind: ExportKind::Named,
            resolved: None,
            external: false,
        }
    }

    fn statement(kind: ExportKind, source: Option<&str>, exports: Vec<Export>) -> ExportStatement {
        ExportStatement {
            id: StatementId(0),
            kind,
            source: source.map(String::from),
            target: None,
            exports,
            declaration: false,
            placement: Placement::Inserted { offset: 0, seq: 0 },
            dirty: false,
        }
    }

    fn import(type_only: bool, bindings: Vec<ImportBinding>) -> ImportStatement {
        ImportStatement {
            id: StatementId(1),
            file: FileId(0),
            specifier: "./feature".to_string(),
            target: None,
            type_only,
            namespace: None,
            bindings,
            placement: Placement::Inserted { offset: 0, seq: 0 },
            dirty: false,
        }
    }

    fn binding(name: &str, alias: Option<&str>, type_only: bool) -> ImportBinding {
        ImportBinding {
            id: ImportId(0),
            name: name.to_string(),
            alias: alias.map(String::from),
            type_only,
        }
    }

    #[test]
    fn test_render_export_forms() {
        let wildcard = statement(ExportKind::Wildcard, Some("../x"), vec![export("*", "*")]);
        assert_eq!(render_export(&wildcard), "export * from \"../x\";");

        let named = statement(
            ExportKind::Named,
            Some("./internal"),
            vec![export("W", "Widget"), export("Gadget", "Gadget")],
        );
        assert_eq!(
            render_export(&named),
            "export { Widget as W, Gadget } from \"./internal\";"
        );

        let types = statement(ExportKind::Type, Some("./types"), vec![export("Props", "Props")]);
        assert_eq!(render_export(&types), "export type { Props } from \"./types\";");

        let local = statement(ExportKind::Named, None, vec![export("y", "x")]);
        assert_eq!(render_export(&local), "export { x as y };");
    }

    #[test]
    fn test_render_import_forms() {
        let named = import(false, vec![binding("Widget", Some("W"), false), binding("Props", None, true)]);
        assert_eq!(
            render_import(&named),
            "import { Widget as W, type Props } from \"./feature\";"
        );

        let type_only = import(true, vec![binding("Props", None, false)]);
        assert_eq!(render_import(&type_only), "import type { Props } from \"./feature\";");

        let mut with_default = import(false, vec![binding("default", Some("React"), false)]);
        with_default.namespace = Some("all".to_string());
        assert_eq!(
            render_import(&with_default),
            "import React, * as all from \"./feature\";"
        );

        let mixed = import(
            false,
            vec![binding("useState", None, false), binding("default", Some("React"), false)],
        );
        assert_eq!(
            render_import(&mixed),
            "import React, { useState } from \"./feature\";"
        );

        let side_effect = import(false, vec![]);
        assert_eq!(render_import(&side_effect), "import \"./feature\";");
    }

    #[test]
    fn test_apply_edits_orders_inserts_before_replacement() {
        let source = "import { a } from \"./a\";\nconst x = 1;\n";
        let span = 0..24;
        let edits = vec![
            Edit::replace(span.clone(), "import { b } from \"./a\";".to_string()),
            Edit::insert(0, "import { a } from \"./c\";\n".to_string(), 2),
            Edit::insert(0, "import { z } from \"./c\";\n".to_string(), 1),
        ];

        let out = apply_edits(source, edits);
        assert_eq!(
            out,
            "import { z } from \"./c\";\nimport { a } from \"./c\";\nimport { b } from \"./a\";\nconst x = 1;\n"
        );
    }

    #[test]
    fn test_apply_edits_delete_and_append() {
        let source = "export { a } from \"./a\";\nexport const b = 1;\n";
        let removal = removal_range(source, &(0..24));
        let append = line_start_after(source, 44);

        let out = apply_edits(
            source,
            vec![
                Edit::delete(removal),
                Edit::insert(append, "export * from \"./c\";\n".to_string(), 0),
            ],
        );
        assert_eq!(out, "export const b = 1;\nexport * from \"./c\";\n");
    }

    #[test]
    fn test_removal_range_variants() {
        let source = "a;  \nb; // keep\nc;";
        assert_eq!(removal_range(source, &(0..2)), 0..5);
        assert_eq!(removal_range(source, &(5..7)), 5..7);
        assert_eq!(removal_range(source, &(15..17)), 15..17);

        let crlf = "a;\r\nb;";
        assert_eq!(removal_range(crlf, &(0..2)), 0..4);
    }

    #[test]
    fn test_line_start_after() {
        let source = "a;\nb;";
        assert_eq!(line_start_after(source, 2), 3);
        assert_eq!(line_start_after(source, 5), 5);
    }
}

//! Integration tests for whole consolidation passes.
//!
//! Projects are built in memory and every pass runs as a dry run, so the
//! assertions look at the planned file contents.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use barrel_fold::codebase::{CodebaseModel, FileChange, Project};
use barrel_fold::consolidate::{consolidate, ConsolidateOptions, ConsolidationReport, SkipReason};

// ============================================================================
// Test Helpers
// ============================================================================

fn options() -> ConsolidateOptions {
    ConsolidateOptions {
        dry_run: true,
        ..Default::default()
    }
}

fn load(sources: &[(&str, &str)]) -> Project {
    Project::from_sources(Path::new("/virtual"), sources).expect("Failed to build project")
}

fn run(sources: &[(&str, &str)]) -> ConsolidationReport {
    let mut project = load(sources);
    consolidate(&mut project, &options()).expect("Pass failed")
}

fn change<'a>(report: &'a ConsolidationReport, path: &str) -> Option<&'a FileChange> {
    report.changes.iter().find(|c| c.path() == path)
}

fn contents<'a>(report: &'a ConsolidationReport, path: &str) -> &'a str {
    change(report, path)
        .and_then(|c| c.contents())
        .unwrap_or_else(|| panic!("no new contents for {}", path))
}

fn is_removed(report: &ConsolidationReport, path: &str) -> bool {
    matches!(change(report, path), Some(FileChange::Remove { .. }))
}

/// Source tree after applying a planned pass.
fn applied(sources: &[(&str, &str)], report: &ConsolidationReport) -> BTreeMap<String, String> {
    let mut tree: BTreeMap<String, String> = sources
        .iter()
        .map(|(p, s)| (p.to_string(), s.to_string()))
        .collect();
    for change in &report.changes {
        match change {
            FileChange::Create { path, contents } | FileChange::Modify { path, contents } => {
                tree.insert(path.clone(), contents.clone());
            }
            FileChange::Remove { path } => {
                tree.remove(path);
            }
        }
    }
    tree
}

fn rerun(tree: &BTreeMap<String, String>) -> ConsolidationReport {
    let sources: Vec<(&str, &str)> = tree.iter().map(|(p, s)| (p.as_str(), s.as_str())).collect();
    run(&sources)
}

/// Names reachable through the first import of `consumer` in `tree`.
fn names_through_import(tree: &BTreeMap<String, String>, consumer: &str) -> BTreeSet<String> {
    let sources: Vec<(&str, &str)> = tree.iter().map(|(p, s)| (p.as_str(), s.as_str())).collect();
    let project = load(&sources);
    let file = project.find_file(consumer).expect("consumer is missing");
    let target = project.import_statements(file)[0]
        .target
        .unwrap_or_else(|| panic!("import in {} does not resolve", consumer));
    project.module_exports(target)
}

// ============================================================================
// Scenarios
// ============================================================================

mod scenarios {
    use super::*;

    const SCENARIO_A: &[(&str, &str)] = &[
        ("src/feature/internal.ts", "export class Widget {}\n"),
        ("src/feature/index.ts", "export { Widget } from \"./internal\";\n"),
        ("src/index.ts", "export * from \"./feature\";\n"),
        ("src/app.ts", "import { Widget } from \"./feature\";\n"),
        ("src/main.ts", "import { Widget } from \"./index\";\n"),
    ];

    #[test]
    fn test_scenario_a_forwards_from_public_barrel() {
        let report = run(SCENARIO_A);

        assert_eq!(
            contents(&report, "src/shared/feature/index.ts"),
            "export { Widget } from \"../../feature/internal\";\n"
        );
        assert_eq!(
            contents(&report, "src/app.ts"),
            "import { Widget } from \"./shared/feature\";\n"
        );
        assert!(is_removed(&report, "src/feature/index.ts"));
        assert!(change(&report, "src/feature/internal.ts").is_none());
    }

    #[test]
    fn test_scenario_a_wildcard_follows_consolidated_barrel() {
        let report = run(SCENARIO_A);

        assert_eq!(
            contents(&report, "src/shared/index.ts"),
            "export * from \"./feature\";\n"
        );
        assert_eq!(
            contents(&report, "src/main.ts"),
            "import { Widget } from \"./shared\";\n"
        );
        assert!(is_removed(&report, "src/index.ts"));
    }

    #[test]
    fn test_scenario_a_report_counts() {
        let report = run(SCENARIO_A);

        assert!(report.dry_run);
        assert_eq!(report.exports_consolidated, 2);
        assert_eq!(report.usages_rewritten, 2);
        assert_eq!(report.files_created, 2);
        assert_eq!(report.files_modified, 2);
        assert_eq!(report.files_removed, 2);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_scenario_b_keeps_alias_and_consumer_name() {
        let report = run(&[
            ("tsconfig.json", r#"{ "compilerOptions": { "baseUrl": "." } }"#),
            ("src/feature/internal.ts", "export class Widget {}\n"),
            ("src/feature/index.ts", "export { Widget as W } from \"./internal\";\n"),
            ("src/app.ts", "import { W } from \"src/feature\";\n\nconst w = new W();\n"),
        ]);

        assert_eq!(
            contents(&report, "src/shared/feature/index.ts"),
            "export { Widget as W } from \"../../feature/internal\";\n"
        );
        assert_eq!(
            contents(&report, "src/app.ts"),
            "import { W } from \"src/shared/feature\";\n\nconst w = new W();\n"
        );
        assert!(is_removed(&report, "src/feature/index.ts"));
    }
}

// ============================================================================
// Merging
// ============================================================================

mod merging {
    use super::*;

    #[test]
    fn test_names_collapse_most_recent_first() {
        let report = run(&[
            (
                "src/feature/internal.ts",
                "export const a = 1;\nexport const b = 2;\nexport const c = 3;\nexport type T = string;\n",
            ),
            (
                "src/feature/index.ts",
                "export { a } from \"./internal\";\nexport { b, c } from \"./internal\";\nexport type { T } from \"./internal\";\n",
            ),
        ]);

        assert_eq!(
            contents(&report, "src/shared/feature/index.ts"),
            "export { c, b, a } from \"../../feature/internal\";\nexport type { T } from \"../../feature/internal\";\n"
        );
        assert_eq!(report.exports_consolidated, 4);
    }

    #[test]
    fn test_merges_into_existing_canonical_statement() {
        let report = run(&[
            ("src/feature/internal.ts", "export const a = 1;\nexport const b = 2;\n"),
            ("src/feature/index.ts", "export { b } from \"./internal\";\n"),
            (
                "src/shared/feature/index.ts",
                "export { a } from \"../../feature/internal\";\n",
            ),
        ]);

        assert_eq!(
            contents(&report, "src/shared/feature/index.ts"),
            "export { b, a } from \"../../feature/internal\";\n"
        );
        assert_eq!(report.skipped_for(SkipReason::AlreadyCanonical).count(), 1);
    }

    #[test]
    fn test_default_export_forwarded_by_name() {
        let report = run(&[
            ("src/feature/internal.ts", "export default class Widget {}\n"),
            ("src/feature/index.ts", "export { default as Widget } from \"./internal\";\n"),
        ]);

        assert_eq!(
            contents(&report, "src/shared/feature/index.ts"),
            "export { default as Widget } from \"../../feature/internal\";\n"
        );
    }

    #[test]
    fn test_barrel_with_declarations_is_kept() {
        let report = run(&[
            ("src/feature/internal.ts", "export class Widget {}\n"),
            (
                "src/feature/index.ts",
                "export { Widget } from \"./internal\";\n\nexport const VERSION = 1;\n",
            ),
            ("src/app.ts", "import { Widget, VERSION } from \"./feature\";\n"),
        ]);

        assert_eq!(contents(&report, "src/feature/index.ts"), "\nexport const VERSION = 1;\n");
        assert_eq!(
            contents(&report, "src/app.ts"),
            "import { Widget } from \"./shared/feature\";\nimport { VERSION } from \"./feature\";\n"
        );
    }
}

// ============================================================================
// Wildcard Coverage
// ============================================================================

mod wildcard_coverage {
    use super::*;

    const COVERED: &[(&str, &str)] = &[
        ("src/feature/internal.ts", "export class Widget {}\nexport class Gadget {}\n"),
        (
            "src/feature/index.ts",
            "export { Widget as W } from \"./internal\";\nexport { Gadget } from \"./internal\";\nexport * from \"./internal\";\n",
        ),
        ("src/shared/feature/index.ts", "export * from \"../../feature/internal\";\n"),
        ("src/app.ts", "import { W } from \"./feature\";\nimport { Gadget as G } from \"./feature\";\n"),
    ];

    #[test]
    fn test_covered_exports_add_no_statement() {
        let report = run(COVERED);

        assert!(change(&report, "src/shared/feature/index.ts").is_none());
        assert!(is_removed(&report, "src/feature/index.ts"));
        assert_eq!(report.exports_consolidated, 3);
    }

    #[test]
    fn test_covered_alias_imports_original_name() {
        let report = run(COVERED);

        assert_eq!(
            contents(&report, "src/app.ts"),
            "import { Widget as W } from \"./shared/feature\";\nimport { Gadget as G } from \"./shared/feature\";\n"
        );
        assert_eq!(report.usages_rewritten, 2);
    }

    #[test]
    fn test_wildcard_chain_through_consolidated_barrel() {
        let report = run(&[
            ("src/feature/internal.ts", "export class Widget {}\n"),
            ("src/feature/a.ts", "export * from \"./internal\";\n"),
            ("src/feature/b.ts", "export * from \"./internal\";\nexport * from \"./a\";\n"),
            ("src/shared/feature/a.ts", "export const local = 1;\n"),
        ]);

        assert_eq!(
            contents(&report, "src/shared/feature/a.ts"),
            "export const local = 1;\nexport * from \"../../feature/internal\";\n"
        );
        let b = contents(&report, "src/shared/feature/b.ts");
        assert_eq!(b.matches("export * from \"../../feature/internal\";").count(), 1);
        assert!(b.contains("export * from \"./a\";"));
    }

    const WILDCARD_FIRST: &[(&str, &str)] = &[
        ("src/a/index.ts", "export * from \"../b\";\n"),
        ("src/b/index.ts", "export { X } from \"./x\";\n"),
        ("src/b/x.ts", "export const X = 1;\n"),
        ("src/app.ts", "import { X } from \"./a\";\n"),
    ];

    #[test]
    fn test_wildcard_before_its_target_follows_consolidated_barrel() {
        let report = run(WILDCARD_FIRST);

        assert_eq!(contents(&report, "src/shared/a/index.ts"), "export * from \"../b\";\n");
        assert_eq!(
            contents(&report, "src/shared/b/index.ts"),
            "export { X } from \"../../b/x\";\n"
        );
        assert_eq!(contents(&report, "src/app.ts"), "import { X } from \"./shared/a\";\n");
        assert!(is_removed(&report, "src/a/index.ts"));
        assert!(is_removed(&report, "src/b/index.ts"));
        assert_eq!(report.references_redirected, 1);
    }

    #[test]
    fn test_wildcard_before_its_target_keeps_imports_resolving() {
        let report = run(WILDCARD_FIRST);
        let tree = applied(WILDCARD_FIRST, &report);

        assert!(names_through_import(&tree, "src/app.ts").contains("X"));
        assert!(rerun(&tree).is_noop());
    }
}

// ============================================================================
// Import Rewriting
// ============================================================================

mod rewriting {
    use super::*;

    #[test]
    fn test_alias_paths_translated_per_consumer() {
        let report = run(&[
            (
                "tsconfig.json",
                r#"{
                    // shared code is reachable through an alias
                    "compilerOptions": {
                        "baseUrl": ".",
                        "paths": { "@shared/*": ["src/shared/*"], },
                    },
                }"#,
            ),
            ("src/feature/internal.ts", "export class Widget {}\n"),
            ("src/feature/index.ts", "export { Widget } from \"./internal\";\n"),
            ("src/app.ts", "import { Widget } from \"./feature\";\n"),
        ]);

        assert_eq!(
            contents(&report, "src/app.ts"),
            "import { Widget } from \"@shared/feature\";\n"
        );
    }

    #[test]
    fn test_type_only_declarations_stay_type_only() {
        let report = run(&[
            ("src/feature/internal.ts", "export interface Props {}\nexport class Widget {}\n"),
            (
                "src/feature/index.ts",
                "export type { Props } from \"./internal\";\nexport { Widget } from \"./internal\";\n",
            ),
            (
                "src/app.ts",
                "import type { Props } from \"./feature\";\nimport { Widget, type Props as P } from \"./feature\";\n",
            ),
        ]);

        assert_eq!(
            contents(&report, "src/shared/feature/index.ts"),
            "export type { Props } from \"../../feature/internal\";\nexport { Widget } from \"../../feature/internal\";\n"
        );
        assert_eq!(
            contents(&report, "src/app.ts"),
            "import type { Props } from \"./shared/feature\";\nimport { type Props as P } from \"./shared/feature\";\nimport { Widget } from \"./shared/feature\";\n"
        );
        assert_eq!(report.usages_rewritten, 3);
    }

    #[test]
    fn test_default_import_follows_forwarded_default() {
        let sources: &[(&str, &str)] = &[
            ("src/feature/internal.ts", "export default class Widget {}\nexport class Gadget {}\n"),
            (
                "src/feature/index.ts",
                "export { default } from \"./internal\";\nexport { Gadget } from \"./internal\";\n",
            ),
            ("src/app.ts", "import Widget, { Gadget } from \"./feature\";\n"),
        ];
        let report = run(sources);

        assert_eq!(
            contents(&report, "src/shared/feature/index.ts"),
            "export { Gadget, default } from \"../../feature/internal\";\n"
        );
        assert_eq!(
            contents(&report, "src/app.ts"),
            "import Widget from \"./shared/feature\";\nimport { Gadget } from \"./shared/feature\";\n"
        );
        assert!(is_removed(&report, "src/feature/index.ts"));
        assert_eq!(report.usages_rewritten, 2);

        let names = names_through_import(&applied(sources, &report), "src/app.ts");
        assert!(names.contains("default"));
    }

    #[test]
    fn test_namespace_import_of_removed_barrel_redirected() {
        let sources: &[(&str, &str)] = &[
            ("src/feature/internal.ts", "export class Widget {}\n"),
            ("src/feature/index.ts", "export { Widget } from \"./internal\";\n"),
            ("src/app.ts", "import * as feature from \"./feature\";\n\nnew feature.Widget();\n"),
        ];
        let report = run(sources);

        assert!(is_removed(&report, "src/feature/index.ts"));
        assert_eq!(
            contents(&report, "src/app.ts"),
            "import * as feature from \"./shared/feature\";\n\nnew feature.Widget();\n"
        );
        assert_eq!(report.references_redirected, 1);
        assert_eq!(report.usages_rewritten, 0);

        let names = names_through_import(&applied(sources, &report), "src/app.ts");
        assert!(names.contains("Widget"));
    }

    #[test]
    fn test_imports_of_kept_barrel_untouched() {
        let report = run(&[
            ("src/feature/internal.ts", "export class Widget {}\n"),
            (
                "src/feature/index.ts",
                "export { Widget } from \"./internal\";\nexport default 1;\n",
            ),
            ("src/app.ts", "import * as feature from \"./feature\";\nimport one from \"./feature\";\n"),
        ]);

        assert!(change(&report, "src/app.ts").is_none());
        assert_eq!(report.usages_rewritten, 0);
        assert_eq!(report.references_redirected, 0);
        assert_eq!(contents(&report, "src/feature/index.ts"), "export default 1;\n");
    }
}

// ============================================================================
// Idempotence
// ============================================================================

mod idempotence {
    use super::*;

    #[test]
    fn test_second_pass_performs_no_edits() {
        let sources: &[(&str, &str)] = &[
            ("src/feature/internal.ts", "export class Widget {}\nexport type Props = {};\n"),
            (
                "src/feature/index.ts",
                "export { Widget as W } from \"./internal\";\nexport type { Props } from \"./internal\";\n",
            ),
            ("src/index.ts", "export * from \"./feature\";\n"),
            ("src/app.ts", "import { W, type Props } from \"./feature\";\nimport { W as Root } from \"./index\";\n"),
        ];
        let first = run(sources);
        assert!(!first.is_noop());

        let second = rerun(&applied(sources, &first));
        assert!(second.is_noop());
        assert_eq!(second.usages_rewritten, 0);
        assert_eq!(second.exports_consolidated, 0);
        assert!(second
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::AlreadyCanonical));
    }

    #[test]
    fn test_canonical_files_are_never_candidates() {
        let report = run(&[
            ("src/shared/feature/internal.ts", "export const a = 1;\n"),
            ("src/shared/feature/index.ts", "export { a } from \"./internal\";\n"),
        ]);

        assert!(report.is_noop());
        assert_eq!(report.skipped_for(SkipReason::AlreadyCanonical).count(), 1);
    }
}

// ============================================================================
// Fault Isolation
// ============================================================================

mod fault_isolation {
    use super::*;

    #[test]
    fn test_conflict_skipped_while_siblings_proceed() {
        let report = run(&[
            ("src/feature/internal.ts", "export class Props {}\nexport class Widget {}\n"),
            (
                "src/feature/index.ts",
                "export { Props } from \"./internal\";\nexport { Widget } from \"./internal\";\n",
            ),
            (
                "src/shared/feature/index.ts",
                "export type { Props } from \"../../feature/internal\";\n",
            ),
            ("src/app.ts", "import { Props } from \"./feature\";\n"),
        ]);

        let conflicts: Vec<_> = report.skipped_for(SkipReason::MergeConflict).collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].export, "Props");
        assert_eq!(conflicts[0].file, "src/feature/index.ts");

        assert_eq!(
            contents(&report, "src/shared/feature/index.ts"),
            "export type { Props } from \"../../feature/internal\";\nexport { Widget } from \"../../feature/internal\";\n"
        );
        assert_eq!(
            contents(&report, "src/feature/index.ts"),
            "export { Props } from \"./internal\";\n"
        );
        assert!(change(&report, "src/app.ts").is_none());
    }

    #[test]
    fn test_unresolved_exports_skipped() {
        let report = run(&[
            ("src/feature/internal.ts", "export class Widget {}\n"),
            (
                "src/feature/index.ts",
                "export { Missing } from \"./internal\";\nexport { gone } from \"./nowhere\";\nexport { useState } from \"react\";\n",
            ),
        ]);

        assert!(report.is_noop());
        assert_eq!(report.skipped_for(SkipReason::Unresolved).count(), 2);
        assert!(report.skipped.iter().all(|s| s.export != "useState"));
    }

    #[test]
    fn test_rejects_identical_roots() {
        let mut project = load(&[("src/a.ts", "export const a = 1;\n")]);
        let options = ConsolidateOptions {
            public_root: "src/".to_string(),
            ..options()
        };
        assert!(consolidate(&mut project, &options).is_err());
    }

    #[test]
    fn test_scope_limits_candidates() {
        let mut project = load(&[
            ("src/feature/internal.ts", "export class Widget {}\n"),
            ("src/feature/index.ts", "export { Widget } from \"./internal\";\n"),
            ("src/other/index.ts", "export { Widget } from \"../feature/internal\";\n"),
        ]);
        let options = ConsolidateOptions {
            scope: "src/other/".to_string(),
            ..options()
        };
        let report = consolidate(&mut project, &options).unwrap();

        assert!(change(&report, "src/feature/index.ts").is_none());
        assert!(is_removed(&report, "src/other/index.ts"));
        let other = project.find_file("src/shared/other/index.ts");
        assert!(other.is_some());
    }
}

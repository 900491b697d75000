use std::ops::Range;

use tree_sitter::Node;

use crate::codebase::parser::ParsedFile;
use crate::codebase::types::{ExportKind, SymbolKind};

/// Export statement as found in the source, before ids are assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExportStatement {
    pub kind: ExportKind,
    pub source: Option<String>,
    /// `(local_name, exported_name)` pairs
    pub entries: Vec<(String, String)>,
    pub declaration: bool,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImportBinding {
    pub name: String,
    pub alias: Option<String>,
    pub type_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImportStatement {
    pub specifier: String,
    pub type_only: bool,
    pub default_binding: Option<String>,
    pub namespace: Option<String>,
    pub bindings: Vec<RawImportBinding>,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub exported: bool,
}

/// Result of extraction containing top-level statements and declarations
#[derive(Debug, Default)]
pub struct ExtractionResult {
    pub exports: Vec<RawExportStatement>,
    pub imports: Vec<RawImportStatement>,
    pub symbols: Vec<RawSymbol>,
}

pub struct StatementExtractor;

impl StatementExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract module statements and declarations from a parsed file.
    ///
    /// Only direct children of the program node are considered; nested
    /// declarations never affect a module's export surface.
    pub fn extract_all(&self, parsed: &ParsedFile) -> ExtractionResult {
        let mut result = ExtractionResult::default();
        let root = parsed.root_node();
        let mut cursor = root.walk();
        let children: Vec<Node> = root.named_children(&mut cursor).collect();

        for node in children {
            match node.kind() {
                "import_statement" => {
                    if let Some(import) = self.extract_import(parsed, &node) {
                        result.imports.push(import);
                    }
                }
                "export_statement" => self.extract_export(parsed, &node, &mut result),
                _ => {
                    for (name, kind) in declaration_symbols(parsed, &node) {
                        result.symbols.push(RawSymbol {
                            name,
                            kind,
                            exported: false,
                        });
                    }
                }
            }
        }

        result
    }

    fn extract_export(&self, parsed: &ParsedFile, node: &Node, result: &mut ExtractionResult) {
        let span = node.byte_range();
        let source = node
            .child_by_field_name("source")
            .map(|s| unquote(parsed.node_text(&s)));

        if has_token(node, "default") {
            if let Some(declaration) = node.child_by_field_name("declaration") {
                for (name, kind) in declaration_symbols(parsed, &declaration) {
                    result.symbols.push(RawSymbol {
                        name,
                        kind,
                        exported: true,
                    });
                }
            }
            result.exports.push(RawExportStatement {
                kind: ExportKind::Named,
                source: None,
                entries: vec![("default".to_string(), "default".to_string())],
                declaration: true,
                span,
            });
            return;
        }

        if let Some(declaration) = node.child_by_field_name("declaration") {
            let mut entries = Vec::new();
            for (name, kind) in declaration_symbols(parsed, &declaration) {
                entries.push((name.clone(), name.clone()));
                result.symbols.push(RawSymbol {
                    name,
                    kind,
                    exported: true,
                });
            }
            result.exports.push(RawExportStatement {
                kind: ExportKind::Named,
                source: None,
                entries,
                declaration: true,
                span,
            });
            return;
        }

        if let Some(namespace) = find_named_child(node, "namespace_export") {
            // `export * as ns from "x"` binds a new name; it is not a plain forward
            let name = last_named_text(parsed, &namespace).unwrap_or_default();
            result.exports.push(RawExportStatement {
                kind: ExportKind::Named,
                source,
                entries: vec![("*".to_string(), name)],
                declaration: true,
                span,
            });
            return;
        }

        if has_token(node, "*") {
            result.exports.push(RawExportStatement {
                kind: ExportKind::Wildcard,
                source,
                entries: vec![("*".to_string(), "*".to_string())],
                declaration: false,
                span,
            });
            return;
        }

        if let Some(clause) = find_named_child(node, "export_clause") {
            let kind = if has_token(node, "type") {
                ExportKind::Type
            } else {
                ExportKind::Named
            };

            let mut cursor = clause.walk();
            let entries = clause
                .named_children(&mut cursor)
                .filter(|spec| spec.kind() == "export_specifier")
                .filter_map(|spec| {
                    let local = spec.child_by_field_name("name")?;
                    let local = unquote(parsed.node_text(&local));
                    let exported = spec
                        .child_by_field_name("alias")
                        .map(|alias| unquote(parsed.node_text(&alias)))
                        .unwrap_or_else(|| local.clone());
                    Some((local, exported))
                })
                .collect();

            result.exports.push(RawExportStatement {
                kind,
                source,
                entries,
                declaration: false,
                span,
            });
            return;
        }

        // `export = x;` and `export as namespace X;`
        result.exports.push(RawExportStatement {
            kind: ExportKind::Named,
            source: None,
            entries: Vec::new(),
            declaration: true,
            span,
        });
    }

    fn extract_import(&self, parsed: &ParsedFile, node: &Node) -> Option<RawImportStatement> {
        let source = node.child_by_field_name("source")?;
        let specifier = unquote(parsed.node_text(&source));

        let mut import = RawImportStatement {
            specifier,
            type_only: has_token(node, "type"),
            default_binding: None,
            namespace: None,
            bindings: Vec::new(),
            span: node.byte_range(),
        };

        let Some(clause) = find_named_child(node, "import_clause") else {
            // Side-effect import
            return Some(import);
        };

        let mut cursor = clause.walk();
        let parts: Vec<Node> = clause.named_children(&mut cursor).collect();
        for part in parts {
            match part.kind() {
                "identifier" => {
                    import.default_binding = Some(parsed.node_text(&part).to_string());
                }
                "namespace_import" => {
                    import.namespace = last_named_text(parsed, &part);
                }
                "named_imports" => {
                    let mut inner = part.walk();
                    for spec in part.named_children(&mut inner) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        import.bindings.push(RawImportBinding {
                            name: unquote(parsed.node_text(&name)),
                            alias: spec
                                .child_by_field_name("alias")
                                .map(|alias| parsed.node_text(&alias).to_string()),
                            type_only: has_token(&spec, "type"),
                        });
                    }
                }
                _ => {}
            }
        }

        Some(import)
    }
}

impl Default for StatementExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Names introduced by a declaration node.
fn declaration_symbols(parsed: &ParsedFile, node: &Node) -> Vec<(String, SymbolKind)> {
    let named = |kind: SymbolKind| -> Vec<(String, SymbolKind)> {
        node.child_by_field_name("name")
            .map(|name| vec![(parsed.node_text(&name).to_string(), kind)])
            .unwrap_or_default()
    };

    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            named(SymbolKind::Function)
        }
        "class_declaration" | "abstract_class_declaration" => named(SymbolKind::Class),
        "interface_declaration" => named(SymbolKind::Interface),
        "type_alias_declaration" => named(SymbolKind::TypeAlias),
        "enum_declaration" => named(SymbolKind::Enum),
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .filter(|child| child.kind() == "variable_declarator")
                .filter_map(|declarator| declarator.child_by_field_name("name"))
                .filter(|name| name.kind() == "identifier")
                .map(|name| (parsed.node_text(&name).to_string(), SymbolKind::Variable))
                .collect()
        }
        "internal_module" | "module" => match node.child_by_field_name("name") {
            // `declare module "pkg"` augments another module
            Some(name) if name.kind() != "string" => {
                vec![(parsed.node_text(&name).to_string(), SymbolKind::Namespace)]
            }
            _ => Vec::new(),
        },
        "ambient_declaration" | "expression_statement" => {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            children
                .iter()
                .flat_map(|child| declaration_symbols(parsed, child))
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Whether `node` has a direct anonymous child token with the given text.
fn has_token(node: &Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

fn find_named_child<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|child| child.kind() == kind);
    found
}

fn last_named_text(parsed: &ParsedFile, node: &Node) -> Option<String> {
    let mut cursor = node.walk();
    let last = node.named_children(&mut cursor).last();
    last.map(|n| unquote(parsed.node_text(&n)))
}

fn unquote(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

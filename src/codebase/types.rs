use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Handle to a file inside a loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub(crate) usize);

/// Handle to an export or import statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatementId(pub(crate) u32);

/// Handle to a single entry of an export statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExportId(pub(crate) u32);

/// Handle to a single named binding of an import declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportId(pub(crate) u32);

/// Shape of an export statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportKind {
    /// `export * from "x"`
    Wildcard,
    /// `export { a, b as c } from "x"`
    Named,
    /// `export type { A } from "x"`
    Type,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Wildcard => "wildcard",
            ExportKind::Named => "named",
            ExportKind::Type => "type",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a top-level declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    TypeAlias,
    Enum,
    Variable,
    Namespace,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::TypeAlias => "type_alias",
            SymbolKind::Enum => "enum",
            SymbolKind::Variable => "variable",
            SymbolKind::Namespace => "namespace",
        }
    }
}

/// A locally declared top-level symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub file: FileId,
    pub kind: SymbolKind,
    pub exported: bool,
}

/// Weak reference to the declaration an export forwards.
///
/// Only used for lookups. For wildcard exports `file` is the forwarded module
/// and `name` is `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRef {
    pub file: FileId,
    pub name: String,
}

/// One entry of an export statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub id: ExportId,
    /// Name visible to importers of the exporting module (`*` for wildcards)
    pub name: String,
    /// Name inside the source module (equal to `name` unless aliased)
    pub local_name: String,
    pub kind: ExportKind,
    pub resolved: Option<SymbolRef>,
    /// Forwarded from a module outside the project (a package)
    pub external: bool,
}

impl Export {
    pub fn is_aliased(&self) -> bool {
        self.name != self.local_name
    }

    /// Renders the entry as it appears between braces.
    pub fn specifier(&self) -> String {
        if self.is_aliased() {
            format!("{} as {}", self.local_name, self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Entry handed to the model when creating or extending a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub name: String,
    pub local_name: String,
}

impl ExportEntry {
    pub fn new(local_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            name: name.into(),
        }
    }

    pub fn wildcard() -> Self {
        Self::new("*", "*")
    }
}

/// Where a statement's text lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Parsed from the file; byte span in the original source
    Original(Range<usize>),
    /// Added during the pass; rendered at `offset` in insertion order
    Inserted { offset: usize, seq: u32 },
}

#[derive(Debug, Clone)]
pub struct ExportStatement {
    pub id: StatementId,
    pub kind: ExportKind,
    /// Module specifier for re-exports; `None` for local export statements
    pub source: Option<String>,
    pub target: Option<FileId>,
    pub exports: Vec<Export>,
    /// `export const x`, `export default ...` and other forms never re-rendered
    pub declaration: bool,
    pub(crate) placement: Placement,
    pub(crate) dirty: bool,
}

impl ExportStatement {
    pub fn is_reexport(&self) -> bool {
        self.source.is_some() && !self.declaration
    }

    pub fn find(&self, id: ExportId) -> Option<&Export> {
        self.exports.iter().find(|e| e.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub id: ImportId,
    /// Name exported by the source module
    pub name: String,
    pub alias: Option<String>,
    /// Inline `type` modifier (`import { type A } from ...`)
    pub type_only: bool,
}

impl ImportBinding {
    /// `import X from ...`, held as `default` bound to `X`.
    pub fn is_default(&self) -> bool {
        self.name == "default" && self.alias.is_some() && !self.type_only
    }

    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn specifier(&self) -> String {
        let prefix = if self.type_only { "type " } else { "" };
        match &self.alias {
            Some(alias) if alias != &self.name => format!("{}{} as {}", prefix, self.name, alias),
            _ => format!("{}{}", prefix, self.name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportStatement {
    pub id: StatementId,
    pub file: FileId,
    pub specifier: String,
    pub target: Option<FileId>,
    pub type_only: bool,
    pub namespace: Option<String>,
    /// Named bindings; a default import is the binding named `default`
    pub bindings: Vec<ImportBinding>,
    pub(crate) placement: Placement,
    pub(crate) dirty: bool,
}

impl ImportStatement {
    /// True when nothing is bound any more and the declaration can go.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.namespace.is_none()
    }
}

/// Draft of an import declaration to be inserted by the model.
#[derive(Debug, Clone)]
pub struct NewImport {
    pub specifier: String,
    pub target: Option<FileId>,
    pub type_only: bool,
    pub binding: NewBinding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBinding {
    pub name: String,
    pub alias: Option<String>,
    pub type_only: bool,
}

impl NewBinding {
    /// Keeps the binding exactly as the consumer wrote it.
    pub fn from_binding(binding: &ImportBinding) -> Self {
        Self {
            name: binding.name.clone(),
            alias: binding.alias.clone(),
            type_only: binding.type_only,
        }
    }
}

/// An import binding, named or default, that refers to an export.
#[derive(Debug, Clone)]
pub struct ImportUsage {
    pub file: FileId,
    pub statement: StatementId,
    pub binding: ImportBinding,
    pub type_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Loaded,
    Created,
    Removed,
}

/// Pending change to one file, as produced by `CodebaseModel::plan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum FileChange {
    Create { path: String, contents: String },
    Modify { path: String, contents: String },
    Remove { path: String },
}

impl FileChange {
    pub fn path(&self) -> &str {
        match self {
            FileChange::Create { path, .. }
            | FileChange::Modify { path, .. }
            | FileChange::Remove { path } => path,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        match self {
            FileChange::Create { contents, .. } | FileChange::Modify { contents, .. } => {
                Some(contents)
            }
            FileChange::Remove { .. } => None,
        }
    }
}

/// Counts of what a commit wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub files_created: usize,
    pub files_modified: usize,
    pub files_removed: usize,
}

impl CommitSummary {
    pub fn from_changes(changes: &[FileChange]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change {
                FileChange::Create { .. } => summary.files_created += 1,
                FileChange::Modify { .. } => summary.files_modified += 1,
                FileChange::Remove { .. } => summary.files_removed += 1,
            }
        }
        summary
    }
}

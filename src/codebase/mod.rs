//! In-memory model of a TypeScript/JavaScript module graph.
//!
//! The consolidation pass only talks to [`CodebaseModel`]; [`Project`] is the
//! tree-sitter backed implementation used by the CLI and the tests.

pub mod commit;
pub mod extractor;
pub mod parser;
pub mod paths;
pub mod progress;
pub mod project;
pub mod render;
pub mod resolver;
pub mod tsconfig;
pub mod types;
pub mod walker;

use std::collections::BTreeSet;

pub use extractor::{ExtractionResult, StatementExtractor};
pub use parser::{ParsedFile, Parser};
pub use progress::LoadProgress;
pub use project::{Project, SourceFile};
pub use resolver::{ModuleResolution, ModuleResolver};
pub use tsconfig::{TsConfig, TsConfigSet};
pub use types::*;
pub use walker::FileWalker;

use crate::error::Result;

/// Read and edit access to a module graph.
///
/// Ids handed out by a model are only meaningful for that model. Edits are
/// buffered: nothing reaches the disk before [`CodebaseModel::commit`].
pub trait CodebaseModel {
    /// Live files in stable order: loaded files sorted by path, then created
    /// files in creation order.
    fn files(&self) -> Vec<FileId>;

    fn file_path(&self, file: FileId) -> &str;

    fn find_file(&self, path: &str) -> Option<FileId>;

    fn status(&self, file: FileId) -> FileStatus;

    fn export_statements(&self, file: FileId) -> &[ExportStatement];

    fn import_statements(&self, file: FileId) -> &[ImportStatement];

    fn declared_symbols(&self, file: FileId) -> &[Symbol];

    /// Names importable from `file`, following wildcards.
    fn module_exports(&self, file: FileId) -> BTreeSet<String>;

    /// Import bindings elsewhere in the project that refer to `export` of `file`.
    fn symbol_usages(&self, file: FileId, export: ExportId) -> Result<Vec<ImportUsage>>;

    /// Bindings importing from `file` a name that `file` does not provide
    /// itself but `provider` does.
    fn wildcard_usages(&self, file: FileId, provider: FileId) -> Result<Vec<ImportUsage>>;

    /// Specifier that `consumer` should use to import `target`, honouring the
    /// consumer's own path aliases.
    fn translate_import_path(&self, consumer: FileId, target: FileId) -> Result<String>;

    /// Plain relative specifier from `from` to `to`.
    fn relative_path(&self, from: FileId, to: FileId) -> String;

    /// Registers an empty file; returns the existing one if `path` is taken.
    fn create_file(&mut self, path: &str) -> Result<FileId>;

    fn remove_file(&mut self, file: FileId) -> Result<()>;

    /// Appends a re-export statement after the file's existing module statements.
    fn add_export_statement(
        &mut self,
        file: FileId,
        kind: ExportKind,
        source: &str,
        target: Option<FileId>,
        entries: Vec<ExportEntry>,
    ) -> Result<StatementId>;

    fn prepend_export(
        &mut self,
        file: FileId,
        statement: StatementId,
        entry: ExportEntry,
    ) -> Result<ExportId>;

    /// Removes one entry; the statement goes away with its last entry.
    fn remove_export(&mut self, file: FileId, statement: StatementId, export: ExportId) -> Result<()>;

    /// Points a re-export statement at `target`, keeping its entries.
    fn retarget_export_statement(
        &mut self,
        file: FileId,
        statement: StatementId,
        source: &str,
        target: FileId,
    ) -> Result<()>;

    /// Points an import declaration at `target`, keeping its bindings.
    fn retarget_import(
        &mut self,
        file: FileId,
        statement: StatementId,
        specifier: &str,
        target: FileId,
    ) -> Result<()>;

    /// Inserts a single-binding import directly before `before`.
    fn insert_import_before(
        &mut self,
        file: FileId,
        before: StatementId,
        import: NewImport,
    ) -> Result<(StatementId, ImportId)>;

    /// Removes one binding; the declaration goes away once nothing is bound.
    fn remove_import_binding(
        &mut self,
        file: FileId,
        statement: StatementId,
        binding: ImportId,
    ) -> Result<()>;

    /// Renders every pending change without touching the disk.
    fn plan(&self) -> Result<Vec<FileChange>>;

    /// Writes the plan atomically.
    fn commit(&mut self) -> Result<CommitSummary>;
}

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::codebase::commit;
use crate::codebase::extractor::{ExtractionResult, StatementExtractor};
use crate::codebase::parser::Parser;
use crate::codebase::paths;
use crate::codebase::progress::LoadProgress;
use crate::codebase::render::{self, Edit};
use crate::codebase::resolver::{KnownFiles, ModuleResolution, ModuleResolver};
use crate::codebase::tsconfig::TsConfigSet;
use crate::codebase::types::*;
use crate::codebase::walker::FileWalker;
use crate::codebase::CodebaseModel;
use crate::error::{ConsolidateError, Result};
use crate::languages::LanguageRegistry;

const TSCONFIG_FILE: &str = "tsconfig.json";

/// One module of the project and its pending edits.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub status: FileStatus,
    pub(crate) source: String,
    pub(crate) exports: Vec<ExportStatement>,
    pub(crate) imports: Vec<ImportStatement>,
    pub(crate) symbols: Vec<Symbol>,
    /// Spans of original statements deleted during the pass
    pub(crate) removed: Vec<Range<usize>>,
    /// Where appended statements go: the line after the last module statement
    pub(crate) append_at: usize,
    created: bool,
}

impl SourceFile {
    pub fn source(&self) -> &str {
        &self.source
    }

    fn export_statement_mut(&mut self, id: StatementId) -> Result<&mut ExportStatement> {
        let path = &self.path;
        self.exports
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| missing_statement(path, id))
    }

    fn render_export(&self, statement: &ExportStatement, spell: Speller<'_>) -> String {
        match statement.source.as_deref().and_then(|source| spell(source, statement.target)) {
            Some(source) => render::render_export(&ExportStatement {
                source: Some(source),
                ..statement.clone()
            }),
            None => render::render_export(statement),
        }
    }

    fn render_import(&self, statement: &ImportStatement, spell: Speller<'_>) -> String {
        match spell(&statement.specifier, statement.target) {
            Some(specifier) => render::render_import(&ImportStatement {
                specifier,
                ..statement.clone()
            }),
            None => render::render_import(statement),
        }
    }

    fn render(&self, spell: Speller<'_>) -> Option<String> {
        if self.created {
            let mut parts: Vec<(u32, String)> = self
                .exports
                .iter()
                .filter_map(|s| match s.placement {
                    Placement::Inserted { seq, .. } => Some((seq, self.render_export(s, spell))),
                    Placement::Original(_) => None,
                })
                .chain(self.imports.iter().filter_map(|s| match s.placement {
                    Placement::Inserted { seq, .. } => Some((seq, self.render_import(s, spell))),
                    Placement::Original(_) => None,
                }))
                .collect();
            if parts.is_empty() {
                return None;
            }
            parts.sort_by_key(|(seq, _)| *seq);
            let mut out = String::new();
            for (_, text) in parts {
                out.push_str(&text);
                out.push('\n');
            }
            return Some(out);
        }

        let mut edits: Vec<Edit> = self
            .removed
            .iter()
            .map(|span| Edit::delete(render::removal_range(&self.source, span)))
            .collect();

        let needs_newline = !self.source.is_empty() && !self.source.ends_with('\n');
        let insert = |offset: usize, seq: u32, text: String| {
            let text = if needs_newline && offset == self.source.len() {
                format!("\n{}\n", text)
            } else {
                format!("{}\n", text)
            };
            Edit::insert(offset, text, seq)
        };

        for statement in &self.exports {
            match &statement.placement {
                Placement::Inserted { offset, seq } => {
                    edits.push(insert(*offset, *seq, self.render_export(statement, spell)))
                }
                Placement::Original(span) if statement.dirty => {
                    edits.push(Edit::replace(span.clone(), self.render_export(statement, spell)))
                }
                Placement::Original(_) => {}
            }
        }
        for statement in &self.imports {
            match &statement.placement {
                Placement::Inserted { offset, seq } => {
                    edits.push(insert(*offset, *seq, self.render_import(statement, spell)))
                }
                Placement::Original(span) if statement.dirty => {
                    edits.push(Edit::replace(span.clone(), self.render_import(statement, spell)))
                }
                Placement::Original(_) => {}
            }
        }

        if edits.is_empty() {
            return None;
        }
        let rendered = render::apply_edits(&self.source, edits);
        (rendered != self.source).then_some(rendered)
    }
}

/// Replacement spelling for a rewritten specifier, if any.
type Speller<'a> = &'a dyn Fn(&str, Option<FileId>) -> Option<String>;

fn missing_statement(path: &str, id: StatementId) -> ConsolidateError {
    ConsolidateError::FileNotFound(format!("statement {:?} in {}", id, path))
}

/// A loaded project: the tree-sitter backed [`CodebaseModel`].
pub struct Project {
    root: PathBuf,
    files: Vec<SourceFile>,
    by_path: HashMap<String, FileId>,
    tsconfigs: TsConfigSet,
    next_id: u32,
    next_seq: u32,
}

struct LoadedSource {
    path: String,
    source: String,
    extraction: ExtractionResult,
}

impl Project {
    /// Walks, parses and links every supported file below `root`.
    pub fn load(root: &Path, ignore: &[String], progress: &LoadProgress) -> Result<Self> {
        if !root.is_dir() {
            return Err(ConsolidateError::FileNotFound(root.display().to_string()));
        }

        let walker = FileWalker::new(LanguageRegistry::new()).with_ignore(ignore);
        let walked = walker.walk(root)?;
        progress.start(walked.sources.len());

        // Each rayon task gets its own parser
        let loaded: Vec<LoadedSource> = walked
            .sources
            .par_iter()
            .map(|file| -> Result<LoadedSource> {
                let path = paths::to_project_path(root, file).ok_or_else(|| {
                    ConsolidateError::FileNotFound(file.display().to_string())
                })?;
                let source = fs::read_to_string(file)?;
                let extraction = parse_and_extract(&Parser::default(), &path, &source)?;
                progress.inc(extraction.exports.len() + extraction.imports.len());
                Ok(LoadedSource {
                    path,
                    source,
                    extraction,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        progress.finish();

        let config_paths: Vec<String> = walked
            .tsconfigs
            .iter()
            .filter_map(|p| paths::to_project_path(root, p))
            .collect();
        let tsconfigs = TsConfigSet::load(&config_paths, |path| {
            fs::read_to_string(root.join(path)).ok()
        });

        let project = Self::assemble(root.to_path_buf(), loaded, tsconfigs);
        info!(
            "Loaded {} files and {} tsconfig files from {}",
            project.files.len(),
            project.tsconfigs.len(),
            root.display()
        );
        Ok(project)
    }

    /// Builds a project from in-memory `(path, contents)` pairs.
    ///
    /// `tsconfig.json` entries are read as configs; everything else must be a
    /// supported source file.
    pub fn from_sources(root: &Path, sources: &[(&str, &str)]) -> Result<Self> {
        let parser = Parser::default();
        let mut loaded = Vec::new();
        let mut config_paths = Vec::new();
        let mut contents: HashMap<String, String> = HashMap::new();

        for (path, source) in sources {
            let path = paths::normalize(path);
            contents.insert(path.clone(), source.to_string());
            if path.ends_with(TSCONFIG_FILE) || path.ends_with(".json") {
                if path.ends_with(TSCONFIG_FILE) {
                    config_paths.push(path);
                }
                continue;
            }
            let extraction = parse_and_extract(&parser, &path, source)?;
            loaded.push(LoadedSource {
                path,
                source: source.to_string(),
                extraction,
            });
        }

        config_paths.sort();
        let tsconfigs = TsConfigSet::load(&config_paths, |path| contents.get(path).cloned());
        Ok(Self::assemble(root.to_path_buf(), loaded, tsconfigs))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file(&self, file: FileId) -> &SourceFile {
        &self.files[file.0]
    }

    pub fn tsconfigs(&self) -> &TsConfigSet {
        &self.tsconfigs
    }

    fn assemble(root: PathBuf, mut loaded: Vec<LoadedSource>, tsconfigs: TsConfigSet) -> Self {
        loaded.sort_by(|a, b| a.path.cmp(&b.path));

        let mut project = Self {
            root,
            files: Vec::with_capacity(loaded.len()),
            by_path: HashMap::new(),
            tsconfigs,
            next_id: 0,
            next_seq: 0,
        };

        for item in loaded {
            let id = FileId(project.files.len());
            let file = project.build_file(id, item);
            project.by_path.insert(file.path.clone(), id);
            project.files.push(file);
        }

        project.resolve_targets();
        project.link_exports();
        project
    }

    fn build_file(&mut self, id: FileId, item: LoadedSource) -> SourceFile {
        let LoadedSource {
            path,
            source,
            extraction,
        } = item;

        let last_end = extraction
            .exports
            .iter()
            .map(|s| s.span.end)
            .chain(extraction.imports.iter().map(|s| s.span.end))
            .max();
        let append_at = last_end
            .map(|end| render::line_start_after(&source, end))
            .unwrap_or(0);

        let exports = extraction
            .exports
            .into_iter()
            .map(|raw| {
                let exports = raw
                    .entries
                    .into_iter()
                    .map(|(local_name, name)| Export {
                        id: ExportId(self.fresh_id()),
                        name,
                        local_name,
                        kind: raw.kind,
                        resolved: None,
                        external: false,
                    })
                    .collect();
                ExportStatement {
                    id: StatementId(self.fresh_id()),
                    kind: raw.kind,
                    source: raw.source,
                    target: None,
                    exports,
                    declaration: raw.declaration,
                    placement: Placement::Original(raw.span),
                    dirty: false,
                }
            })
            .collect();

        let imports = extraction
            .imports
            .into_iter()
            .map(|raw| {
                let mut bindings = Vec::with_capacity(raw.bindings.len() + 1);
                if let Some(local) = raw.default_binding {
                    bindings.push(ImportBinding {
                        id: ImportId(self.fresh_id()),
                        name: "default".to_string(),
                        alias: Some(local),
                        type_only: false,
                    });
                }
                for b in raw.bindings {
                    bindings.push(ImportBinding {
                        id: ImportId(self.fresh_id()),
                        name: b.name,
                        alias: b.alias,
                        type_only: b.type_only,
                    });
                }
                ImportStatement {
                    id: StatementId(self.fresh_id()),
                    file: id,
                    specifier: raw.specifier,
                    target: None,
                    type_only: raw.type_only,
                    namespace: raw.namespace,
                    bindings,
                    placement: Placement::Original(raw.span),
                    dirty: false,
                }
            })
            .collect();

        let symbols = extraction
            .symbols
            .into_iter()
            .map(|s| Symbol {
                name: s.name,
                file: id,
                kind: s.kind,
                exported: s.exported,
            })
            .collect();

        SourceFile {
            path,
            status: FileStatus::Loaded,
            source,
            exports,
            imports,
            symbols,
            removed: Vec::new(),
            append_at,
            created: false,
        }
    }

    fn resolve_targets(&mut self) {
        let known: HashSet<String> = self.by_path.keys().cloned().collect();
        let resolver = ModuleResolver::new(&known, &self.tsconfigs);

        let mut export_targets = Vec::new();
        let mut import_targets = Vec::new();
        for (idx, file) in self.files.iter().enumerate() {
            for (s, statement) in file.exports.iter().enumerate() {
                if let Some(source) = &statement.source {
                    export_targets.push((idx, s, resolver.resolve(&file.path, source)));
                }
            }
            for (s, statement) in file.imports.iter().enumerate() {
                import_targets.push((idx, s, resolver.resolve(&file.path, &statement.specifier)));
            }
        }

        for (idx, s, resolution) in export_targets {
            let target = self.target_id(&resolution);
            let file = &mut self.files[idx];
            let statement = &mut file.exports[s];
            match resolution {
                ModuleResolution::External => {
                    for export in &mut statement.exports {
                        export.external = true;
                    }
                }
                ModuleResolution::Unresolved => debug!(
                    "Unresolved re-export source \"{}\" in {}",
                    statement.source.as_deref().unwrap_or_default(),
                    file.path
                ),
                ModuleResolution::File(_) => {}
            }
            statement.target = target;
        }

        for (idx, s, resolution) in import_targets {
            let target = self.target_id(&resolution);
            self.files[idx].imports[s].target = target;
        }
    }

    fn target_id(&self, resolution: &ModuleResolution) -> Option<FileId> {
        match resolution {
            ModuleResolution::File(path) => self.by_path.get(path).copied(),
            _ => None,
        }
    }

    /// Follows every re-export to the module that declares the forwarded name.
    fn link_exports(&mut self) {
        let mut links = Vec::new();
        for (idx, file) in self.files.iter().enumerate() {
            for (s, statement) in file.exports.iter().enumerate() {
                if !statement.is_reexport() {
                    continue;
                }
                let Some(target) = statement.target else {
                    continue;
                };
                for (e, export) in statement.exports.iter().enumerate() {
                    let resolved = match statement.kind {
                        ExportKind::Wildcard => Some(SymbolRef {
                            file: target,
                            name: "*".to_string(),
                        }),
                        ExportKind::Named | ExportKind::Type => {
                            let mut visited = HashSet::new();
                            self.resolve_name(target, &export.local_name, &mut visited)
                        }
                    };
                    if resolved.is_none() {
                        debug!("`{}` in {} does not resolve to a declaration", export.name, file.path);
                    }
                    links.push((idx, s, e, resolved));
                }
            }
        }

        for (idx, s, e, resolved) in links {
            self.files[idx].exports[s].exports[e].resolved = resolved;
        }
    }

    fn resolve_name(
        &self,
        file: FileId,
        name: &str,
        visited: &mut HashSet<(FileId, String)>,
    ) -> Option<SymbolRef> {
        if !visited.insert((file, name.to_string())) {
            return None;
        }
        let source = &self.files[file.0];

        for statement in &source.exports {
            if statement.kind == ExportKind::Wildcard {
                continue;
            }
            let Some(export) = statement.exports.iter().find(|e| e.name == name) else {
                continue;
            };
            if statement.declaration || statement.source.is_none() {
                return Some(SymbolRef {
                    file,
                    name: name.to_string(),
                });
            }
            return statement
                .target
                .and_then(|target| self.resolve_name(target, &export.local_name, visited));
        }

        // `export *` never forwards the default export
        if name == "default" {
            return None;
        }
        source
            .exports
            .iter()
            .filter(|s| s.kind == ExportKind::Wildcard)
            .filter_map(|s| s.target)
            .find_map(|target| self.resolve_name(target, name, visited))
    }

    fn collect_exports(
        &self,
        file: FileId,
        visited: &mut HashSet<FileId>,
        out: &mut BTreeSet<String>,
        top: bool,
    ) {
        if !visited.insert(file) {
            return;
        }
        let source = &self.files[file.0];
        if source.status == FileStatus::Removed {
            return;
        }
        for statement in &source.exports {
            match statement.kind {
                ExportKind::Wildcard => {
                    if let Some(target) = statement.target {
                        self.collect_exports(target, visited, out, false);
                    }
                }
                ExportKind::Named | ExportKind::Type => {
                    for export in &statement.exports {
                        if top || export.name != "default" {
                            out.insert(export.name.clone());
                        }
                    }
                }
            }
        }
    }

    /// Names `file` provides itself, without following wildcards.
    fn own_exports(&self, file: FileId) -> HashSet<&str> {
        self.files[file.0]
            .exports
            .iter()
            .filter(|s| s.kind != ExportKind::Wildcard)
            .flat_map(|s| s.exports.iter().map(|e| e.name.as_str()))
            .chain(self.files[file.0].symbols.iter().map(|s| s.name.as_str()))
            .collect()
    }

    /// Drops a trailing `/index` from a rewritten specifier when the directory
    /// alone reaches the same file among the files that survive the pass.
    fn shortened(&self, importer: &str, specifier: &str, target: Option<FileId>) -> Option<String> {
        let target = &self.files[target?.0];
        let dir = specifier.strip_suffix("/index")?;
        if dir.is_empty() || dir == "." || dir == ".." || dir.ends_with("/..") {
            return None;
        }
        let live = LiveFiles(self);
        match ModuleResolver::new(&live, &self.tsconfigs).resolve(importer, dir) {
            ModuleResolution::File(path) if path == target.path => Some(dir.to_string()),
            _ => None,
        }
    }

    /// Bindings of other live files that import from `file` and satisfy `matches`.
    fn bindings_importing<F>(&self, file: FileId, matches: F) -> Vec<ImportUsage>
    where
        F: Fn(&ImportBinding) -> bool,
    {
        let mut usages = Vec::new();
        for (idx, consumer) in self.files.iter().enumerate() {
            if idx == file.0 || consumer.status == FileStatus::Removed {
                continue;
            }
            for import in &consumer.imports {
                if import.target != Some(file) {
                    continue;
                }
                for binding in import.bindings.iter().filter(|b| matches(b)) {
                    usages.push(ImportUsage {
                        file: FileId(idx),
                        statement: import.id,
                        binding: binding.clone(),
                        type_only: import.type_only || binding.type_only,
                    });
                }
            }
        }
        usages
    }

    fn live_file_mut(&mut self, file: FileId) -> Result<&mut SourceFile> {
        let source = self
            .files
            .get_mut(file.0)
            .ok_or_else(|| ConsolidateError::FileNotFound(format!("{:?}", file)))?;
        if source.status == FileStatus::Removed {
            return Err(ConsolidateError::FileNotFound(format!(
                "{} was removed",
                source.path
            )));
        }
        Ok(source)
    }

    fn fresh_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn fresh_seq(&mut self) -> u32 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

/// Paths of files that are not removed.
struct LiveFiles<'a>(&'a Project);

impl KnownFiles for LiveFiles<'_> {
    fn contains_file(&self, path: &str) -> bool {
        self.0
            .by_path
            .get(path)
            .is_some_and(|id| self.0.files[id.0].status != FileStatus::Removed)
    }
}

fn parse_and_extract(parser: &Parser, path: &str, source: &str) -> Result<ExtractionResult> {
    let parsed = parser.parse_source_for(Path::new(path), source)?;
    if parsed.root_node().has_error() {
        warn!("{} has syntax errors; statements may be incomplete", path);
    }
    Ok(StatementExtractor::new().extract_all(&parsed))
}

impl CodebaseModel for Project {
    fn files(&self) -> Vec<FileId> {
        self.files
            .iter()
            .enumerate()
            .filter(|(_, f)| f.status != FileStatus::Removed)
            .map(|(idx, _)| FileId(idx))
            .collect()
    }

    fn file_path(&self, file: FileId) -> &str {
        &self.files[file.0].path
    }

    fn find_file(&self, path: &str) -> Option<FileId> {
        self.by_path.get(path).copied()
    }

    fn status(&self, file: FileId) -> FileStatus {
        self.files[file.0].status
    }

    fn export_statements(&self, file: FileId) -> &[ExportStatement] {
        &self.files[file.0].exports
    }

    fn import_statements(&self, file: FileId) -> &[ImportStatement] {
        &self.files[file.0].imports
    }

    fn declared_symbols(&self, file: FileId) -> &[Symbol] {
        &self.files[file.0].symbols
    }

    fn module_exports(&self, file: FileId) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_exports(file, &mut HashSet::new(), &mut out, true);
        out
    }

    fn symbol_usages(&self, file: FileId, export: ExportId) -> Result<Vec<ImportUsage>> {
        let origin = &self.files[file.0];
        let (statement, entry) = origin
            .exports
            .iter()
            .find_map(|s| s.find(export).map(|e| (s, e)))
            .ok_or_else(|| {
                ConsolidateError::FileNotFound(format!("export {:?} in {}", export, origin.path))
            })?;

        match statement.kind {
            ExportKind::Wildcard => match statement.target {
                Some(target) => self.wildcard_usages(file, target),
                None => Ok(Vec::new()),
            },
            ExportKind::Named | ExportKind::Type => {
                Ok(self.bindings_importing(file, |binding| binding.name == entry.name))
            }
        }
    }

    fn wildcard_usages(&self, file: FileId, provider: FileId) -> Result<Vec<ImportUsage>> {
        let own = self.own_exports(file);
        let forwarded: HashSet<String> = self
            .module_exports(provider)
            .into_iter()
            .filter(|name| name != "default" && !own.contains(name.as_str()))
            .collect();

        Ok(self.bindings_importing(file, |binding| forwarded.contains(&binding.name)))
    }

    fn translate_import_path(&self, consumer: FileId, target: FileId) -> Result<String> {
        let target_file = &self.files[target.0];
        if target_file.status == FileStatus::Removed {
            return Err(ConsolidateError::FileNotFound(format!(
                "{} was removed",
                target_file.path
            )));
        }
        let consumer_path = &self.files[consumer.0].path;

        if let Some(config) = self.tsconfigs.nearest(consumer_path) {
            if let Some(specifier) = config.translate(&target_file.path) {
                return Ok(specifier);
            }
        }
        Ok(paths::relative_specifier(consumer_path, &target_file.path))
    }

    fn relative_path(&self, from: FileId, to: FileId) -> String {
        paths::relative_specifier(&self.files[from.0].path, &self.files[to.0].path)
    }

    fn create_file(&mut self, path: &str) -> Result<FileId> {
        let path = paths::normalize(path);
        if path.is_empty() {
            return Err(ConsolidateError::FileNotFound("empty path".to_string()));
        }
        if let Some(&id) = self.by_path.get(&path) {
            let file = &mut self.files[id.0];
            if file.status == FileStatus::Removed {
                file.status = if file.created {
                    FileStatus::Created
                } else {
                    FileStatus::Loaded
                };
            }
            return Ok(id);
        }

        let id = FileId(self.files.len());
        debug!("Creating {}", path);
        self.by_path.insert(path.clone(), id);
        self.files.push(SourceFile {
            path,
            status: FileStatus::Created,
            source: String::new(),
            exports: Vec::new(),
            imports: Vec::new(),
            symbols: Vec::new(),
            removed: Vec::new(),
            append_at: 0,
            created: true,
        });
        Ok(id)
    }

    fn remove_file(&mut self, file: FileId) -> Result<()> {
        let source = self.live_file_mut(file)?;
        debug!("Removing {}", source.path);
        source.status = FileStatus::Removed;
        Ok(())
    }

    fn add_export_statement(
        &mut self,
        file: FileId,
        kind: ExportKind,
        source: &str,
        target: Option<FileId>,
        entries: Vec<ExportEntry>,
    ) -> Result<StatementId> {
        let statement_id = StatementId(self.fresh_id());
        let seq = self.fresh_seq();
        let exports: Vec<Export> = entries
            .into_iter()
            .map(|entry| {
                let resolved = target.map(|t| SymbolRef {
                    file: t,
                    name: entry.local_name.clone(),
                });
                Export {
                    id: ExportId(self.fresh_id()),
                    name: entry.name,
                    local_name: entry.local_name,
                    kind,
                    resolved,
                    external: false,
                }
            })
            .collect();

        let owner = self.live_file_mut(file)?;
        let offset = owner.append_at;
        owner.exports.push(ExportStatement {
            id: statement_id,
            kind,
            source: Some(source.to_string()),
            target,
            exports,
            declaration: false,
            placement: Placement::Inserted { offset, seq },
            dirty: true,
        });
        Ok(statement_id)
    }

    fn prepend_export(
        &mut self,
        file: FileId,
        statement: StatementId,
        entry: ExportEntry,
    ) -> Result<ExportId> {
        let id = ExportId(self.fresh_id());
        let owner = self.live_file_mut(file)?;
        let statement = owner.export_statement_mut(statement)?;
        let resolved = statement.target.map(|t| SymbolRef {
            file: t,
            name: entry.local_name.clone(),
        });
        statement.exports.insert(
            0,
            Export {
                id,
                name: entry.name,
                local_name: entry.local_name,
                kind: statement.kind,
                resolved,
                external: false,
            },
        );
        statement.dirty = true;
        Ok(id)
    }

    fn remove_export(&mut self, file: FileId, statement: StatementId, export: ExportId) -> Result<()> {
        let owner = self.live_file_mut(file)?;
        let idx = owner
            .exports
            .iter()
            .position(|s| s.id == statement)
            .ok_or_else(|| missing_statement(&owner.path, statement))?;

        let target = &mut owner.exports[idx];
        let before = target.exports.len();
        target.exports.retain(|e| e.id != export);
        if target.exports.len() == before {
            return Err(ConsolidateError::FileNotFound(format!(
                "export {:?} in {}",
                export, owner.path
            )));
        }
        target.dirty = true;

        if target.exports.is_empty() {
            let removed = owner.exports.remove(idx);
            if let Placement::Original(span) = removed.placement {
                owner.removed.push(span);
            }
        }
        Ok(())
    }

    fn retarget_export_statement(
        &mut self,
        file: FileId,
        statement: StatementId,
        source: &str,
        target: FileId,
    ) -> Result<()> {
        let owner = self.live_file_mut(file)?;
        let statement = owner.export_statement_mut(statement)?;
        debug!(
            "Retargeting re-export \"{}\" to \"{}\"",
            statement.source.as_deref().unwrap_or_default(),
            source
        );
        statement.source = Some(source.to_string());
        statement.target = Some(target);
        if statement.kind == ExportKind::Wildcard {
            for export in &mut statement.exports {
                export.resolved = Some(SymbolRef {
                    file: target,
                    name: "*".to_string(),
                });
            }
        }
        statement.dirty = true;
        Ok(())
    }

    fn retarget_import(
        &mut self,
        file: FileId,
        statement: StatementId,
        specifier: &str,
        target: FileId,
    ) -> Result<()> {
        let owner = self.live_file_mut(file)?;
        let path = &owner.path;
        let import = owner
            .imports
            .iter_mut()
            .find(|s| s.id == statement)
            .ok_or_else(|| missing_statement(path, statement))?;
        debug!("Retargeting import \"{}\" to \"{}\"", import.specifier, specifier);
        import.specifier = specifier.to_string();
        import.target = Some(target);
        import.dirty = true;
        Ok(())
    }

    fn insert_import_before(
        &mut self,
        file: FileId,
        before: StatementId,
        import: NewImport,
    ) -> Result<(StatementId, ImportId)> {
        let statement_id = StatementId(self.fresh_id());
        let binding_id = ImportId(self.fresh_id());
        let seq = self.fresh_seq();

        let owner = self.live_file_mut(file)?;
        let position = owner
            .imports
            .iter()
            .position(|s| s.id == before)
            .ok_or_else(|| missing_statement(&owner.path, before))?;
        let offset = match &owner.imports[position].placement {
            Placement::Original(span) => span.start,
            Placement::Inserted { offset, .. } => *offset,
        };

        owner.imports.insert(
            position,
            ImportStatement {
                id: statement_id,
                file,
                specifier: import.specifier,
                target: import.target,
                type_only: import.type_only,
                namespace: None,
                bindings: vec![ImportBinding {
                    id: binding_id,
                    name: import.binding.name,
                    alias: import.binding.alias,
                    type_only: import.binding.type_only,
                }],
                placement: Placement::Inserted { offset, seq },
                dirty: true,
            },
        );
        Ok((statement_id, binding_id))
    }

    fn remove_import_binding(
        &mut self,
        file: FileId,
        statement: StatementId,
        binding: ImportId,
    ) -> Result<()> {
        let owner = self.live_file_mut(file)?;
        let idx = owner
            .imports
            .iter()
            .position(|s| s.id == statement)
            .ok_or_else(|| missing_statement(&owner.path, statement))?;

        let target = &mut owner.imports[idx];
        let before = target.bindings.len();
        target.bindings.retain(|b| b.id != binding);
        if target.bindings.len() == before {
            return Err(ConsolidateError::FileNotFound(format!(
                "import binding {:?} in {}",
                binding, owner.path
            )));
        }
        target.dirty = true;

        if target.is_empty() {
            let removed = owner.imports.remove(idx);
            if let Placement::Original(span) = removed.placement {
                owner.removed.push(span);
            }
        }
        Ok(())
    }

    fn plan(&self) -> Result<Vec<FileChange>> {
        let mut changes = Vec::new();
        for file in &self.files {
            let spell = |specifier: &str, target: Option<FileId>| {
                self.shortened(&file.path, specifier, target)
            };
            match file.status {
                FileStatus::Removed if !file.created => changes.push(FileChange::Remove {
                    path: file.path.clone(),
                }),
                FileStatus::Removed => {}
                FileStatus::Created => {
                    if let Some(contents) = file.render(&spell) {
                        changes.push(FileChange::Create {
                            path: file.path.clone(),
                            contents,
                        });
                    }
                }
                FileStatus::Loaded => {
                    if let Some(contents) = file.render(&spell) {
                        changes.push(FileChange::Modify {
                            path: file.path.clone(),
                            contents,
                        });
                    }
                }
            }
        }
        Ok(changes)
    }

    fn commit(&mut self) -> Result<CommitSummary> {
        let changes = self.plan()?;
        let summary = commit::write_changes(&self.root, &changes)?;
        info!(
            "Committed {} created, {} modified, {} removed files",
            summary.files_created, summary.files_modified, summary.files_removed
        );
        Ok(summary)
    }
}

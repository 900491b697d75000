use std::path::{Path, PathBuf};

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

use crate::error::{ConsolidateError, Result};
use crate::languages::LanguageRegistry;

const TSCONFIG_FILE: &str = "tsconfig.json";

/// Files found under a project root, sorted by path.
#[derive(Debug, Default)]
pub struct WalkResult {
    pub sources: Vec<PathBuf>,
    pub tsconfigs: Vec<PathBuf>,
}

pub struct FileWalker {
    registry: LanguageRegistry,
    ignore: Vec<String>,
}

impl FileWalker {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self {
            registry,
            ignore: Vec::new(),
        }
    }

    /// Extra gitignore-style globs excluded from the walk.
    pub fn with_ignore(mut self, globs: &[String]) -> Self {
        self.ignore.extend(globs.iter().cloned());
        self
    }

    pub fn walk(&self, root: &Path) -> Result<WalkResult> {
        let mut overrides = OverrideBuilder::new(root);
        for glob in &self.ignore {
            overrides
                .add(&format!("!{}", glob))
                .map_err(|e| ConsolidateError::Config(format!("invalid ignore glob `{}`: {}", glob, e)))?;
        }
        let overrides = overrides
            .build()
            .map_err(|e| ConsolidateError::Config(e.to_string()))?;

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .overrides(overrides)
            .filter_entry(|entry| entry.file_name() != "node_modules")
            .build();

        let mut result = WalkResult::default();
        for entry in walker.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.file_name().is_some_and(|name| name == TSCONFIG_FILE) {
                result.tsconfigs.push(path.to_path_buf());
            } else if self.is_supported(path) {
                result.sources.push(path.to_path_buf());
            }
        }

        result.sources.sort();
        result.tsconfigs.sort();
        Ok(result)
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.registry.is_module_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_walker() -> FileWalker {
        FileWalker::new(LanguageRegistry::new())
    }

    fn create_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_walk_finds_typescript_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "app.ts", "const x = 1;");
        create_file(temp_dir.path(), "component.tsx", "export default () => null;");
        create_file(temp_dir.path(), "utils.js", "function test() {}");
        create_file(temp_dir.path(), "comp.jsx", "export const C = () => null;");

        let files = create_walker().walk(temp_dir.path()).unwrap();

        assert_eq!(files.sources.len(), 4);
        assert!(files.tsconfigs.is_empty());
    }

    #[test]
    fn test_walk_sorted_and_recursive() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "src/z.ts", "");
        create_file(temp_dir.path(), "src/feature/index.ts", "");
        create_file(temp_dir.path(), "src/a.ts", "");

        let files = create_walker().walk(temp_dir.path()).unwrap();

        let names: Vec<_> = files
            .sources
            .iter()
            .map(|p| p.strip_prefix(temp_dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("src/a.ts"),
                PathBuf::from("src/feature/index.ts"),
                PathBuf::from("src/z.ts"),
            ]
        );
    }

    #[test]
    fn test_walk_collects_tsconfig() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "tsconfig.json", "{}");
        create_file(temp_dir.path(), "packages/app/tsconfig.json", "{}");
        create_file(temp_dir.path(), "package.json", "{}");

        let files = create_walker().walk(temp_dir.path()).unwrap();

        assert_eq!(files.tsconfigs.len(), 2);
        assert!(files.sources.is_empty());
    }

    #[test]
    fn test_walk_skips_node_modules() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "src/index.ts", "");
        create_file(temp_dir.path(), "node_modules/react/index.js", "");
        create_file(temp_dir.path(), "packages/a/node_modules/x/index.ts", "");

        let files = create_walker().walk(temp_dir.path()).unwrap();

        assert_eq!(files.sources.len(), 1);
    }

    #[test]
    fn test_walk_applies_ignore_globs() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "src/index.ts", "");
        create_file(temp_dir.path(), "src/generated/api.ts", "");
        create_file(temp_dir.path(), "src/legacy.js", "");

        let walker = create_walker().with_ignore(&["src/generated/**".to_string(), "*.js".to_string()]);
        let files = walker.walk(temp_dir.path()).unwrap();

        assert_eq!(files.sources.len(), 1);
        assert!(files.sources[0].ends_with("src/index.ts"));
    }

    #[test]
    fn test_walk_ignores_unsupported_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "main.ts", "");
        create_file(temp_dir.path(), "README.md", "# Readme");
        create_file(temp_dir.path(), "script.py", "print('hello')");

        let files = create_walker().walk(temp_dir.path()).unwrap();

        assert_eq!(files.sources.len(), 1);
    }

    #[test]
    fn test_walk_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let files = create_walker().walk(temp_dir.path()).unwrap();
        assert!(files.sources.is_empty());
    }

    #[test]
    fn test_is_supported_typescript() {
        let walker = create_walker();
        assert!(walker.is_supported(Path::new("app.ts")));
        assert!(walker.is_supported(Path::new("types/global.d.ts")));
        assert!(!walker.is_supported(Path::new("lib.rs")));
    }
}

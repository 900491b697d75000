pub mod typescript;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// A tree-sitter grammar and the module file extensions it parses.
pub trait LanguageGrammar: Send + Sync {
    fn name(&self) -> &'static str;
    fn file_extensions(&self) -> &[&'static str];
    fn language(&self) -> tree_sitter::Language;
}

/// Grammars keyed by file extension.
pub struct LanguageRegistry {
    by_extension: BTreeMap<&'static str, Arc<dyn LanguageGrammar>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            by_extension: BTreeMap::new(),
        };
        registry.register(Arc::new(typescript::TypeScriptGrammar));
        registry.register(Arc::new(typescript::TsxGrammar));
        registry
    }

    /// Later registrations win for shared extensions.
    pub fn register(&mut self, grammar: Arc<dyn LanguageGrammar>) {
        for ext in grammar.file_extensions() {
            self.by_extension.insert(*ext, Arc::clone(&grammar));
        }
    }

    pub fn grammar_for(&self, path: &Path) -> Option<Arc<dyn LanguageGrammar>> {
        let ext = path.extension()?.to_str()?;
        self.by_extension.get(ext).cloned()
    }

    pub fn is_module_file(&self, path: &Path) -> bool {
        self.grammar_for(path).is_some()
    }

    /// Registered extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        self.by_extension.keys().copied().collect()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typescript_family_uses_plain_grammar() {
        let registry = LanguageRegistry::new();
        for file in ["a.ts", "a.mts", "a.cts", "a.js", "a.mjs", "a.cjs", "types/global.d.ts"] {
            let grammar = registry.grammar_for(Path::new(file)).unwrap();
            assert_eq!(grammar.name(), "typescript", "file {}", file);
        }
    }

    #[test]
    fn test_jsx_family_uses_tsx_grammar() {
        let registry = LanguageRegistry::new();
        assert_eq!(registry.grammar_for(Path::new("App.tsx")).unwrap().name(), "tsx");
        assert_eq!(registry.grammar_for(Path::new("App.jsx")).unwrap().name(), "tsx");
    }

    #[test]
    fn test_non_module_files() {
        let registry = LanguageRegistry::default();
        assert!(!registry.is_module_file(Path::new("Makefile")));
        assert!(!registry.is_module_file(Path::new("tsconfig.json")));
        assert!(!registry.is_module_file(Path::new("main.rs")));
        assert!(registry.is_module_file(Path::new("src/index.ts")));
    }

    #[test]
    fn test_supported_extensions_sorted() {
        let registry = LanguageRegistry::new();
        assert_eq!(
            registry.supported_extensions(),
            vec!["cjs", "cts", "js", "jsx", "mjs", "mts", "ts", "tsx"]
        );
    }
}

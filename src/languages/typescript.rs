use super::LanguageGrammar;

/// Plain TypeScript grammar, also used for JavaScript modules without JSX.
pub struct TypeScriptGrammar;

impl LanguageGrammar for TypeScriptGrammar {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["ts", "mts", "cts", "js", "mjs", "cjs"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }
}

/// TSX grammar. Type assertions like `<T>x` are not valid here, JSX is.
pub struct TsxGrammar;

impl LanguageGrammar for TsxGrammar {
    fn name(&self) -> &'static str {
        "tsx"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["tsx", "jsx"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    }
}

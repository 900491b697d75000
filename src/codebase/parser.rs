use std::path::Path;
use std::sync::Arc;

use crate::error::{ConsolidateError, Result};
use crate::languages::{LanguageGrammar, LanguageRegistry};

pub struct Parser {
    registry: LanguageRegistry,
}

impl Parser {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self { registry }
    }

    /// Parses `source` with the grammar picked from `path`'s extension.
    pub fn parse_source_for(&self, path: &Path, source: &str) -> Result<ParsedFile> {
        let grammar = self.registry.grammar_for(path).ok_or_else(|| {
            ConsolidateError::Parse(format!("unsupported file type: {}", path.display()))
        })?;
        self.parse_source(source, grammar)
    }

    pub fn parse_source(&self, source: &str, grammar: Arc<dyn LanguageGrammar>) -> Result<ParsedFile> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar.language())
            .map_err(|e| ConsolidateError::Parse(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ConsolidateError::Parse("Failed to parse source".to_string()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_string(),
            language: grammar.name().to_string(),
        })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(LanguageRegistry::new())
    }
}

pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: String,
    pub language: String,
}

impl ParsedFile {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn node_text(&self, node: &tree_sitter::Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }
}

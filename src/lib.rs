pub mod codebase;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod languages;

use once_cell::sync::Lazy;

pub use codebase::{
    CodebaseModel, Export, ExportEntry, ExportKind, ExportStatement, FileChange, FileId,
    FileStatus, ImportBinding, ImportStatement, LoadProgress, Project,
};
pub use config::{ConfigOverrides, ConsolidationConfig};
pub use consolidate::{
    consolidate, Candidate, ConsolidateOptions, ConsolidationReport, ExportScanner, SkipReason,
};
pub use error::{ConsolidateError, Result};
pub use languages::{LanguageGrammar, LanguageRegistry};

/// Global language registry instance (lazily initialized)
pub static REGISTRY: Lazy<LanguageRegistry> = Lazy::new(LanguageRegistry::new);

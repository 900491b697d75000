use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsolidateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The export's symbol could not be followed to a declaration.
    #[error("Cannot resolve `{export}` in {file}: {reason}")]
    Resolution {
        file: String,
        export: String,
        reason: String,
    },

    /// The same name is forwarded from the same path with both type-only and value semantics.
    #[error("Merge conflict in {file}: `{name}` from \"{path}\" is already forwarded as {existing}")]
    MergeConflict {
        file: String,
        path: String,
        name: String,
        existing: String,
    },

    #[error("Rewrite failed for `{export}` in {file}: {reason}")]
    RewriteFailure {
        file: String,
        export: String,
        reason: String,
    },

    #[error("Commit failed: {0}")]
    Commit(String),
}

impl ConsolidateError {
    /// Per-export errors are recorded and the pass continues; everything else aborts.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConsolidateError::Resolution { .. }
                | ConsolidateError::MergeConflict { .. }
                | ConsolidateError::RewriteFailure { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConsolidateError>;

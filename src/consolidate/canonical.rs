use std::collections::HashMap;

use tracing::debug;

use crate::codebase::{CodebaseModel, FileId};
use crate::error::Result;

/// Maps originating files to their counterparts under the public root.
///
/// Resolution is memoized: one originating path yields one file handle for
/// the whole pass.
#[derive(Debug)]
pub struct CanonicalResolver {
    source_root: String,
    public_root: String,
    memo: HashMap<String, FileId>,
}

impl CanonicalResolver {
    pub fn new(source_root: &str, public_root: &str) -> Self {
        Self {
            source_root: source_root.to_string(),
            public_root: public_root.to_string(),
            memo: HashMap::new(),
        }
    }

    /// Substitutes the first occurrence of the source root with the public root.
    ///
    /// Paths already under the public root, and paths without the source root,
    /// are their own canonical path.
    pub fn canonical_path(&self, origin: &str) -> String {
        let Some(idx) = origin.find(&self.source_root) else {
            return origin.to_string();
        };
        if origin[idx..].starts_with(&self.public_root) {
            return origin.to_string();
        }
        format!(
            "{}{}{}",
            &origin[..idx],
            self.public_root,
            &origin[idx + self.source_root.len()..]
        )
    }

    /// Canonical file for `origin`, created on first reference.
    pub fn resolve(&mut self, model: &mut dyn CodebaseModel, origin: &str) -> Result<FileId> {
        if let Some(&file) = self.memo.get(origin) {
            return Ok(file);
        }

        let canonical = self.canonical_path(origin);
        let file = match model.find_file(&canonical) {
            Some(file) => file,
            None => model.create_file(&canonical)?,
        };
        debug!("Canonical file for {} is {}", origin, canonical);
        self.memo.insert(origin.to_string(), file);
        Ok(file)
    }

    /// Previously resolved canonical file, without creating one.
    pub fn lookup(&self, origin: &str) -> Option<FileId> {
        self.memo.get(origin).copied()
    }
}

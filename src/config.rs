//! `barrel-fold.toml` handling.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consolidate::ConsolidateOptions;
use crate::error::{ConsolidateError, Result};

pub const CONFIG_FILE: &str = "barrel-fold.toml";

/// Settings read from `barrel-fold.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConsolidationConfig {
    /// Path prefix of the files whose re-exports are consolidated
    #[serde(default = "default_scope")]
    pub scope: String,

    #[serde(default = "default_source_root")]
    pub source_root: String,

    #[serde(default = "default_public_root")]
    pub public_root: String,

    /// Extra globs excluded from discovery
    #[serde(default)]
    pub ignore: Vec<String>,
}

fn default_scope() -> String {
    "src/".to_string()
}

fn default_source_root() -> String {
    "src/".to_string()
}

fn default_public_root() -> String {
    "src/shared/".to_string()
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            source_root: default_source_root(),
            public_root: default_public_root(),
            ignore: Vec::new(),
        }
    }
}

/// Values given on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub scope: Option<String>,
    pub source_root: Option<String>,
    pub public_root: Option<String>,
}

impl ConsolidationConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConsolidateError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConsolidateError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reads `explicit` if given, else `barrel-fold.toml` under `root` when it
    /// exists, else the defaults.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = root.join(CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(scope) = overrides.scope {
            self.scope = scope;
        }
        if let Some(source_root) = overrides.source_root {
            self.source_root = source_root;
        }
        if let Some(public_root) = overrides.public_root {
            self.public_root = public_root;
        }
        self
    }

    pub fn options(&self, dry_run: bool) -> Result<ConsolidateOptions> {
        let options = ConsolidateOptions {
            scope: self.scope.clone(),
            source_root: self.source_root.clone(),
            public_root: self.public_root.clone(),
            dry_run,
        };
        options.validate()?;
        Ok(options)
    }
}

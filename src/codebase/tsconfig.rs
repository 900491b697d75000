//! `tsconfig.json` path-alias configuration.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::codebase::paths;
use crate::error::{ConsolidateError, Result};

const MAX_EXTENDS_DEPTH: usize = 8;

/// One `compilerOptions.paths` entry with targets made project-relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAlias {
    pub pattern: String,
    pub targets: Vec<String>,
}

/// Effective module-resolution options of a single tsconfig file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsConfig {
    pub path: String,
    /// Project-relative directory named by `baseUrl`
    pub base_url: Option<String>,
    /// Sorted so that the longest literal prefix is tried first
    pub paths: Vec<PathAlias>,
}

#[derive(Debug, Default)]
struct RawOptions {
    base_url: Option<String>,
    paths: Option<(Vec<(String, Vec<String>)>, String)>,
}

impl TsConfig {
    /// Parses `path` and every config it extends.
    pub fn load<F>(path: &str, read: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = load_raw(path, read, 0)?;

        let mut aliases: Vec<PathAlias> = match raw.paths {
            Some((entries, declared_in)) => {
                let base = raw.base_url.clone().unwrap_or(declared_in);
                entries
                    .into_iter()
                    .map(|(pattern, targets)| PathAlias {
                        pattern,
                        targets: targets.iter().map(|t| paths::join(&base, t)).collect(),
                    })
                    .collect()
            }
            None => Vec::new(),
        };
        aliases.sort_by(|a, b| {
            let a_prefix = a.pattern.split('*').next().map(str::len).unwrap_or(0);
            let b_prefix = b.pattern.split('*').next().map(str::len).unwrap_or(0);
            b_prefix.cmp(&a_prefix).then_with(|| a.pattern.cmp(&b.pattern))
        });

        Ok(Self {
            path: path.to_string(),
            base_url: raw.base_url,
            paths: aliases,
        })
    }

    pub fn dir(&self) -> &str {
        paths::parent(&self.path)
    }

    /// Project-relative module locations a non-relative specifier may refer to.
    ///
    /// Candidates carry no extension; the caller probes them against the
    /// file set.
    pub fn resolve_candidates(&self, specifier: &str) -> Vec<String> {
        let mut candidates = Vec::new();

        for alias in &self.paths {
            if let Some(captured) = match_pattern(&alias.pattern, specifier) {
                for target in &alias.targets {
                    candidates.push(target.replacen('*', captured, 1));
                }
            }
        }

        if let Some(base) = &self.base_url {
            candidates.push(paths::join(base, specifier));
        }

        candidates
    }

    /// Non-relative specifier for `file` under this config, if any alias or
    /// `baseUrl` reaches it.
    pub fn translate(&self, file: &str) -> Option<String> {
        let module = paths::strip_module_extension(file);

        for alias in &self.paths {
            for target in &alias.targets {
                let target = paths::strip_module_extension(target);
                match target.split_once('*') {
                    Some((prefix, suffix)) => {
                        if module.len() >= prefix.len() + suffix.len()
                            && module.starts_with(prefix)
                            && module.ends_with(suffix)
                        {
                            let captured = &module[prefix.len()..module.len() - suffix.len()];
                            if !captured.is_empty() {
                                return Some(alias.pattern.replacen('*', captured, 1));
                            }
                        }
                    }
                    None if target == module => return Some(alias.pattern.clone()),
                    None => {}
                }
            }
        }

        let base = self.base_url.as_deref()?;
        if base.is_empty() {
            return Some(module.to_string());
        }
        module
            .strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(str::to_string)
    }
}

fn load_raw<F>(path: &str, read: &F, depth: usize) -> Result<RawOptions>
where
    F: Fn(&str) -> Option<String>,
{
    let text = read(path)
        .ok_or_else(|| ConsolidateError::FileNotFound(format!("tsconfig not found: {}", path)))?;
    let json: Value = serde_json::from_str(&strip_jsonc(&text))
        .map_err(|e| ConsolidateError::Parse(format!("Failed to parse {}: {}", path, e)))?;

    let dir = paths::parent(path);
    let mut options = RawOptions::default();

    for parent in extended_configs(&json, dir) {
        if depth >= MAX_EXTENDS_DEPTH {
            warn!("tsconfig extends chain too deep at {}", path);
            break;
        }
        match load_raw(&parent, read, depth + 1) {
            Ok(inherited) => {
                if inherited.base_url.is_some() {
                    options.base_url = inherited.base_url;
                }
                if inherited.paths.is_some() {
                    options.paths = inherited.paths;
                }
            }
            Err(e) => debug!("Ignoring extended config of {}: {}", path, e),
        }
    }

    let Some(compiler) = json.get("compilerOptions") else {
        return Ok(options);
    };

    if let Some(base) = compiler.get("baseUrl").and_then(|v| v.as_str()) {
        options.base_url = Some(paths::join(dir, base));
    }

    if let Some(Value::Object(map)) = compiler.get("paths") {
        let entries = map
            .iter()
            .map(|(pattern, targets)| {
                let targets = targets
                    .as_array()
                    .map(|arr| arr.iter().filter_map(|t| t.as_str().map(String::from)).collect())
                    .unwrap_or_default();
                (pattern.clone(), targets)
            })
            .collect();
        options.paths = Some((entries, dir.to_string()));
    }

    Ok(options)
}

/// Relative `extends` entries as project-relative paths. Package configs are skipped.
fn extended_configs(json: &Value, dir: &str) -> Vec<String> {
    let specs: Vec<&str> = match json.get("extends") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(arr)) => arr.iter().filter_map(|v| v.as_str()).collect(),
        _ => Vec::new(),
    };

    specs
        .into_iter()
        .filter(|s| paths::is_relative_specifier(s))
        .map(|s| {
            let joined = paths::join(dir, s);
            if joined.ends_with(".json") {
                joined
            } else {
                format!("{}.json", joined)
            }
        })
        .collect()
}

/// Captured `*` text when `specifier` matches a `paths` pattern.
fn match_pattern<'a>(pattern: &str, specifier: &'a str) -> Option<&'a str> {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            if specifier.len() >= prefix.len() + suffix.len()
                && specifier.starts_with(prefix)
                && specifier.ends_with(suffix)
            {
                Some(&specifier[prefix.len()..specifier.len() - suffix.len()])
            } else {
                None
            }
        }
        None if pattern == specifier => Some(""),
        None => None,
    }
}

/// Removes comments and trailing commas so that tsconfig files parse as JSON.
pub fn strip_jsonc(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            '}' | ']' => {
                let trimmed = out.trim_end().len();
                if out[..trimmed].ends_with(',') {
                    out.truncate(trimmed - 1);
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    out
}

/// Every tsconfig of a project, keyed by directory.
#[derive(Debug, Default)]
pub struct TsConfigSet {
    configs: BTreeMap<String, TsConfig>,
}

impl TsConfigSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every config in `config_paths`. Broken configs are logged and skipped.
    pub fn load<F>(config_paths: &[String], read: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut set = Self::new();
        for path in config_paths {
            match TsConfig::load(path, &read) {
                Ok(config) => {
                    debug!(
                        "Loaded {} (baseUrl: {:?}, {} path aliases)",
                        path,
                        config.base_url,
                        config.paths.len()
                    );
                    set.insert(config);
                }
                Err(e) => warn!("Skipping {}: {}", path, e),
            }
        }
        set
    }

    pub fn insert(&mut self, config: TsConfig) {
        self.configs.insert(config.dir().to_string(), config);
    }

    /// Config of the closest enclosing directory of `file`.
    pub fn nearest(&self, file: &str) -> Option<&TsConfig> {
        let mut dir = paths::parent(file);
        loop {
            if let Some(config) = self.configs.get(dir) {
                return Some(config);
            }
            if dir.is_empty() {
                return None;
            }
            dir = paths::parent(dir);
        }
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

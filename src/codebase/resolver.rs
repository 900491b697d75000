use std::collections::HashSet;

use crate::codebase::paths;
use crate::codebase::tsconfig::TsConfigSet;

/// Suffixes probed when a specifier does not name a file exactly.
const EXTENSION_PATTERNS: &[&str] = &[
    "",
    ".ts",
    ".tsx",
    ".d.ts",
    ".mts",
    ".cts",
    ".js",
    ".jsx",
    ".mjs",
    ".cjs",
    "/index.ts",
    "/index.tsx",
    "/index.d.ts",
    "/index.js",
    "/index.jsx",
];

/// Emitted-JavaScript extensions and the sources they are compiled from.
const JS_SOURCE_SIBLINGS: &[(&str, &[&str])] = &[
    (".js", &[".ts", ".tsx"]),
    (".jsx", &[".tsx"]),
    (".mjs", &[".mts"]),
    (".cjs", &[".cts"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleResolution {
    /// A file of the project
    File(String),
    /// A package outside the project
    External,
    /// A relative or aliased specifier that matches no file
    Unresolved,
}

/// Project paths a resolver may land on.
pub trait KnownFiles {
    fn contains_file(&self, path: &str) -> bool;
}

impl KnownFiles for HashSet<String> {
    fn contains_file(&self, path: &str) -> bool {
        self.contains(path)
    }
}

pub struct ModuleResolver<'a, F: KnownFiles + ?Sized = HashSet<String>> {
    files: &'a F,
    tsconfigs: &'a TsConfigSet,
}

impl<'a, F: KnownFiles + ?Sized> ModuleResolver<'a, F> {
    pub fn new(files: &'a F, tsconfigs: &'a TsConfigSet) -> Self {
        Self { files, tsconfigs }
    }

    pub fn resolve(&self, importer: &str, specifier: &str) -> ModuleResolution {
        if paths::is_relative_specifier(specifier) {
            let base = paths::join(paths::parent(importer), specifier);
            return match self.probe(&base) {
                Some(file) => ModuleResolution::File(file),
                None => ModuleResolution::Unresolved,
            };
        }

        let mut aliased = false;
        if let Some(config) = self.tsconfigs.nearest(importer) {
            aliased = config
                .paths
                .iter()
                .any(|alias| alias_matches(&alias.pattern, specifier));
            for candidate in config.resolve_candidates(specifier) {
                if let Some(file) = self.probe(&candidate) {
                    return ModuleResolution::File(file);
                }
            }
        }

        if aliased {
            ModuleResolution::Unresolved
        } else {
            ModuleResolution::External
        }
    }

    fn probe(&self, base: &str) -> Option<String> {
        for pattern in EXTENSION_PATTERNS {
            let candidate = format!("{}{}", base, pattern);
            if self.files.contains_file(&candidate) {
                return Some(candidate);
            }
        }

        for (js_ext, sources) in JS_SOURCE_SIBLINGS {
            if let Some(stem) = base.strip_suffix(js_ext) {
                for ext in *sources {
                    let candidate = format!("{}{}", stem, ext);
                    if self.files.contains_file(&candidate) {
                        return Some(candidate);
                    }
                }
            }
        }

        None
    }
}

fn alias_matches(pattern: &str, specifier: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => specifier.starts_with(prefix) && specifier.ends_with(suffix),
        None => pattern == specifier,
    }
}

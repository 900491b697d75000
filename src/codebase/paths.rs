//! Project-relative POSIX path arithmetic.
//!
//! Every path handled by the model is relative to the project root and uses
//! `/` separators, so these helpers work on plain strings and never touch the
//! filesystem.

use std::path::Path;

/// Extensions stripped when a file path is turned into a module specifier.
/// `.d.ts` must come first so it is removed as a whole.
const MODULE_EXTENSIONS: &[&str] = &[
    ".d.ts", ".ts", ".tsx", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs",
];

/// Converts an OS path under `root` to the model's path form.
pub fn to_project_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Resolves `.` and `..` segments. Leading `..` that escape the root are kept.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Directory part of a file path; empty for files at the root.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

pub fn join(dir: &str, relative: &str) -> String {
    if dir.is_empty() {
        normalize(relative)
    } else {
        normalize(&format!("{}/{}", dir, relative))
    }
}

pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

pub fn strip_module_extension(path: &str) -> &str {
    MODULE_EXTENSIONS
        .iter()
        .find_map(|ext| path.strip_suffix(ext))
        .unwrap_or(path)
}

/// Module specifier that reaches `to_file` from a module located at `from_file`.
///
/// The result always starts with `./` or `../` and carries no extension.
pub fn relative_specifier(from_file: &str, to_file: &str) -> String {
    let from_dir: Vec<&str> = parent(from_file).split('/').filter(|s| !s.is_empty()).collect();
    let target = strip_module_extension(to_file);
    let to: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = Vec::new();
    for _ in common..from_dir.len() {
        segments.push("..");
    }
    segments.extend(&to[common..]);

    let joined = segments.join("/");
    if joined.starts_with("../") {
        joined
    } else {
        format!("./{}", joined)
    }
}

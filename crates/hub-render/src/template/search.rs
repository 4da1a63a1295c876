//! File lookup across ordered search directories.
//!
//! Directories are searched in order and the first hit wins. Within one
//! directory, extensions are tried in [`TEMPLATE_EXTENSIONS`] priority order.

use std::path::{Path, PathBuf};

/// Recognized template file extensions in priority order.
///
/// | Priority | Extension |
/// |----------|-----------|
/// | 1 (highest) | `.jinja` |
/// | 2 | `.jinja2` |
/// | 3 | `.j2` |
/// | 4 (lowest) | `.html` |
pub const TEMPLATE_EXTENSIONS: &[&str] = &[".jinja", ".jinja2", ".j2", ".html"];

/// Finds `stem` (with any of `extensions`) in the first directory that has it.
///
/// A stem that already ends in one of the extensions is looked up verbatim.
pub fn find_file<P: AsRef<Path>>(dirs: &[P], stem: &str, extensions: &[&str]) -> Option<PathBuf> {
    let has_ext = extensions.iter().any(|ext| stem.ends_with(ext));
    for dir in dirs {
        let dir = dir.as_ref();
        if has_ext {
            let candidate = dir.join(stem);
            if candidate.is_file() {
                return Some(candidate);
            }
            continue;
        }
        for ext in extensions {
            let candidate = dir.join(format!("{}{}", stem, ext));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Finds a template file by name using [`TEMPLATE_EXTENSIONS`].
pub fn find_template<P: AsRef<Path>>(dirs: &[P], name: &str) -> Option<PathBuf> {
    find_file(dirs, name, TEMPLATE_EXTENSIONS)
}

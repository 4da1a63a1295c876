//! Translation strings.
//!
//! The loader loads language files for templates and components before
//! running them, and translates its own error messages through the same
//! [`Language`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Translation-string source.
pub trait Language: Send {
    /// Loads the strings for `extension` found under `base`. Returns whether a
    /// file was found.
    fn load(&mut self, extension: &str, base: &Path) -> bool;

    /// Translates `key`, returning the key itself when unknown.
    fn translate(&self, key: &str) -> String;
}

/// INI-style language files at `<base>/language/<tag>/<tag>.<extension>.ini`.
///
/// Lines look like `KEY="Value"`. Blank lines and `;` comments are skipped.
#[derive(Debug, Clone)]
pub struct IniLanguage {
    tag: String,
    strings: HashMap<String, String>,
    loaded: Vec<PathBuf>,
}

impl Default for IniLanguage {
    fn default() -> Self {
        Self::new("en-GB")
    }
}

impl IniLanguage {
    pub fn new(tag: impl Into<String>) -> Self {
        let mut lang = Self {
            tag: tag.into(),
            strings: HashMap::new(),
            loaded: Vec::new(),
        };
        lang.insert(
            "JLIB_APPLICATION_ERROR_COMPONENT_NOT_FOUND",
            "Component not found.",
        );
        lang.insert(
            "JLIB_APPLICATION_ERROR_COMPONENT_NOT_FOUND_OR_ENABLED",
            "Component not found or not enabled.",
        );
        lang
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.strings.insert(key.into().to_uppercase(), value.into());
        self
    }

    /// Files loaded so far, in load order.
    pub fn loaded(&self) -> &[PathBuf] {
        &self.loaded
    }

    pub fn file_path(&self, extension: &str, base: &Path) -> PathBuf {
        base.join("language")
            .join(&self.tag)
            .join(format!("{}.{}.ini", self.tag, extension))
    }

    fn parse(&mut self, source: &str) {
        for line in source.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            self.insert(key.trim(), value.replace("\"_QQ_\"", "\""));
        }
    }
}

impl Language for IniLanguage {
    fn load(&mut self, extension: &str, base: &Path) -> bool {
        let path = self.file_path(extension, base);
        if self.loaded.contains(&path) {
            return true;
        }
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                self.parse(&source);
                tracing::debug!(extension, path = %path.display(), "loaded language file");
                self.loaded.push(path);
                true
            }
            Err(_) => false,
        }
    }

    fn translate(&self, key: &str) -> String {
        self.strings
            .get(&key.to_uppercase())
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

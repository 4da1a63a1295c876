//! Site configuration.
//!
//! Loaded from YAML or JSON. Every key is optional:
//!
//! ```yaml
//! paths:
//!   app: /var/www/app
//!   core: /var/www/core
//! client: site
//! cachetime: 15          # minutes
//! language: en-GB
//! template:
//!   name: kimera
//!   path: app/templates/kimera
//! entry:
//!   extension: php
//!   interpreter: php
//!   timeout_secs: 30
//! mailer: smtp
//! smtphost: mail.example.org
//! smtpport: 587
//! mailfrom: noreply@example.org
//! fromname: Example Hub
//! ```
//!
//! Relative paths are resolved against the directory of the file they were
//! read from.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hub_dispatch::{EntryConfig, TemplateInfo, DEFAULT_CACHETIME};
use hub_mail::MailConfig;
use serde::Deserialize;
use thiserror::Error;

/// Files probed, in order, when no explicit path is given.
pub const CONFIG_FILES: &[&str] = &["hub.yaml", "hub.yml", "hub.json"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub app: PathBuf,
    pub core: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            app: PathBuf::from("app"),
            core: PathBuf::from("core"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateConfig {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EntrySettings {
    pub extension: String,
    pub interpreter: PathBuf,
    /// Zero disables the timeout.
    pub timeout_secs: u64,
}

impl Default for EntrySettings {
    fn default() -> Self {
        let entry = EntryConfig::default();
        Self {
            extension: entry.extension,
            interpreter: entry.interpreter,
            timeout_secs: entry.timeout.map(|t| t.as_secs()).unwrap_or_default(),
        }
    }
}

impl From<&EntrySettings> for EntryConfig {
    fn from(settings: &EntrySettings) -> Self {
        EntryConfig {
            extension: settings.extension.clone(),
            interpreter: settings.interpreter.clone(),
            timeout: (settings.timeout_secs > 0).then(|| Duration::from_secs(settings.timeout_secs)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub paths: PathsConfig,
    pub client: String,
    pub cachetime: u64,
    pub language: String,
    pub template: Option<TemplateConfig>,
    pub entry: EntrySettings,
    #[serde(flatten)]
    pub mail: MailConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            client: "site".to_string(),
            cachetime: DEFAULT_CACHETIME,
            language: "en-GB".to_string(),
            template: None,
            entry: EntrySettings::default(),
            mail: MailConfig::default(),
        }
    }
}

impl HubConfig {
    /// Parses YAML, or JSON when `path` ends in `.json`.
    pub fn from_str(source: &str, path: &Path) -> Result<Self, ConfigError> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(source).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })
        } else if source.trim().is_empty() {
            Ok(Self::default())
        } else {
            serde_yaml::from_str(source).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    /// Reads a config file and resolves its relative paths against the
    /// file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_str(&source, path)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Loads `explicit` when given, otherwise the first of [`CONFIG_FILES`]
    /// found in `dir`, otherwise the defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for name in CONFIG_FILES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }
        tracing::debug!(dir = %dir.display(), "no configuration file found, using defaults");
        let mut config = Self::default();
        config.resolve_paths(dir);
        Ok(config)
    }

    /// [`discover`](Self::discover) relative to the working directory.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        Self::discover(explicit, &cwd)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.paths.app);
        resolve(&mut self.paths.core);
        if let Some(template) = &mut self.template {
            resolve(&mut template.path);
        }
        if self.entry.interpreter.components().count() > 1 {
            resolve(&mut self.entry.interpreter);
        }
    }

    pub fn template_info(&self) -> Option<TemplateInfo> {
        self.template.as_ref().map(|t| TemplateInfo {
            name: t.name.clone(),
            path: t.path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.client, "site");
        assert_eq!(config.cachetime, 15);
        assert_eq!(config.entry.extension, "php");
        assert_eq!(config.entry.timeout_secs, 30);
        assert_eq!(config.mail.mailer, "sendmail");
    }

    #[test]
    fn test_yaml_with_flattened_mail_keys() {
        let yaml = r#"
client: administrator
cachetime: 5
entry:
  extension: sh
  timeout_secs: 0
mailer: smtp
smtphost: mail.example.org
smtpport: 587
"#;
        let config = HubConfig::from_str(yaml, Path::new("hub.yaml")).unwrap();
        assert_eq!(config.client, "administrator");
        assert_eq!(config.cachetime, 5);
        assert_eq!(config.entry.extension, "sh");
        assert_eq!(config.entry.interpreter, PathBuf::from("php"));
        assert_eq!(EntryConfig::from(&config.entry).timeout, None);
        assert_eq!(config.mail.mailer, "smtp");
        assert_eq!(config.mail.smtpport, 587);
        assert_eq!(config.language, "en-GB");
    }

    #[test]
    fn test_quoted_smtp_port() {
        let yaml = "mailer: smtp\nsmtpport: \"2525\"\n";
        let config = HubConfig::from_str(yaml, Path::new("hub.yaml")).unwrap();
        assert_eq!(config.mail.smtpport, 2525);
    }

    #[test]
    fn test_json_by_extension() {
        let json = r#"{"paths": {"app": "/srv/app"}, "mailer_dsn": "null://null"}"#;
        let config = HubConfig::from_str(json, Path::new("hub.json")).unwrap();
        assert_eq!(config.paths.app, PathBuf::from("/srv/app"));
        assert_eq!(config.paths.core, PathBuf::from("core"));
        assert_eq!(config.mail.mailer_dsn, "null://null");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = HubConfig::from_str("\n", Path::new("hub.yaml")).unwrap();
        assert_eq!(config, HubConfig::default());
    }

    #[test]
    fn test_invalid_yaml_names_file() {
        let err = HubConfig::from_str("client: [", Path::new("conf/hub.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("conf/hub.yaml"));
    }

    #[test]
    fn test_relative_paths_resolve_against_file() {
        let mut config = HubConfig {
            template: Some(TemplateConfig {
                name: "kimera".into(),
                path: PathBuf::from("app/templates/kimera"),
            }),
            ..HubConfig::default()
        };
        config.resolve_paths(Path::new("/srv/hub"));
        assert_eq!(config.paths.app, PathBuf::from("/srv/hub/app"));
        assert_eq!(
            config.template_info().unwrap().path,
            PathBuf::from("/srv/hub/app/templates/kimera")
        );
        assert_eq!(config.entry.interpreter, PathBuf::from("php"));
    }
}

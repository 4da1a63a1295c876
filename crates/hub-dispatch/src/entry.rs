//! Legacy entry scripts.
//!
//! Older components ship a procedural entry file `<component>/<name>.<ext>`
//! that prints the page fragment. It runs as a child process through the
//! configured interpreter; request parameters reach it through the
//! environment and its stdout is the component output.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hub_pipe::CommandSpec;

use crate::error::DispatchError;
use crate::request::Request;

/// How entry scripts are located and run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryConfig {
    /// Extension of entry files, without the dot.
    pub extension: String,
    /// Program the entry file is passed to.
    pub interpreter: PathBuf,
    pub timeout: Option<Duration>,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            extension: "php".to_string(),
            interpreter: PathBuf::from("php"),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl EntryConfig {
    /// `<dir>/<name>.<extension>`.
    pub fn file_in(&self, dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.{}", name, self.extension))
    }
}

/// Environment variable carrying request parameter `key`.
pub fn param_var(key: &str) -> String {
    let key: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("HUB_PARAM_{}", key)
}

/// Runs `script` and returns what it printed.
pub fn execute(
    config: &EntryConfig,
    script: &Path,
    option: &str,
    component_path: &Path,
    request: &Request,
) -> Result<String, DispatchError> {
    let mut spec = CommandSpec::new(&config.interpreter)
        .arg(script.as_os_str())
        .current_dir(component_path)
        .env("HUB_OPTION", option)
        .env("HUB_CONTROLLER", request.get_cmd("controller", ""))
        .env("HUB_TASK", request.get_cmd("task", ""))
        .env("HUB_ID", request.get("id").unwrap_or_default())
        .env("HUB_PATH_COMPONENT", component_path.as_os_str());
    for (key, value) in request.vars() {
        spec = spec.env(param_var(key), value);
    }
    if let Some(timeout) = config.timeout {
        spec = spec.timeout(timeout);
    }

    tracing::debug!(option, script = %script.display(), "running entry script");
    Ok(spec.run()?)
}

//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait which lets views render
//! layouts without depending on a specific backend. The default implementation
//! is [`MiniJinjaEngine`].

use std::path::PathBuf;
use std::sync::Arc;

use minijinja::value::Rest;
use minijinja::{Environment, Error, ErrorKind, Value};

use super::search::find_template;
use crate::error::RenderError;
use crate::helper::Helper;

/// A template engine that can render layouts with data.
pub trait TemplateEngine: Send + Sync {
    /// Compiles and renders a template string in one step.
    fn render_template(&self, template: &str, data: &serde_json::Value)
        -> Result<String, RenderError>;

    /// Renders a layout source registered under `name`.
    ///
    /// The name carries the file extension so the engine can choose an
    /// escaping policy (`.html` sources are HTML-escaped).
    fn render_source(
        &mut self,
        name: &str,
        source: &str,
        data: &serde_json::Value,
    ) -> Result<String, RenderError>;

    /// Exposes a view helper to templates as a function of the same name.
    fn add_helper(&mut self, name: &str, helper: Arc<dyn Helper>);
}

/// MiniJinja-based template engine.
///
/// `{% include %}` and `{% extends %}` resolve against the search paths the
/// engine was created with, using the same extension priority as layouts.
///
/// ```rust
/// use hub_render::template::{MiniJinjaEngine, TemplateEngine};
/// use serde_json::json;
///
/// let engine = MiniJinjaEngine::new();
/// let output = engine.render_template("Hello, {{ name }}!", &json!({"name": "World"})).unwrap();
/// assert_eq!(output, "Hello, World!");
/// ```
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    /// Creates an engine with default filters registered and no loader.
    pub fn new() -> Self {
        let mut env = Environment::new();
        register_filters(&mut env);
        Self { env }
    }

    /// Creates an engine whose loader searches `paths` in order.
    pub fn with_search_paths(paths: Vec<PathBuf>) -> Self {
        let mut engine = Self::new();
        engine.env.set_loader(move |name| {
            match find_template(&paths, name) {
                Some(path) => std::fs::read_to_string(&path).map(Some).map_err(|e| {
                    Error::new(
                        ErrorKind::InvalidOperation,
                        format!("failed to read {}: {}", path.display(), e),
                    )
                }),
                None => Ok(None),
            }
        });
        engine
    }

    /// Returns a reference to the underlying MiniJinja environment.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Returns a mutable reference to the underlying MiniJinja environment.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render_template(
        &self,
        template: &str,
        data: &serde_json::Value,
    ) -> Result<String, RenderError> {
        let value = Value::from_serialize(data);
        Ok(self.env.render_str(template, value)?)
    }

    fn render_source(
        &mut self,
        name: &str,
        source: &str,
        data: &serde_json::Value,
    ) -> Result<String, RenderError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())?;
        let tmpl = self.env.get_template(name)?;
        Ok(tmpl.render(Value::from_serialize(data))?)
    }

    fn add_helper(&mut self, name: &str, helper: Arc<dyn Helper>) {
        let helper_name = name.to_string();
        self.env
            .add_function(name.to_string(), move |args: Rest<Value>| -> Result<Value, Error> {
                let json = args
                    .iter()
                    .map(serde_json::to_value)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| Error::new(ErrorKind::BadSerialization, e.to_string()))?;
                let out = helper.invoke(&json).map_err(|e| {
                    Error::new(
                        ErrorKind::InvalidOperation,
                        format!("helper {}: {}", helper_name, e),
                    )
                })?;
                Ok(match out {
                    // Helpers produce markup; don't escape it a second time.
                    serde_json::Value::String(s) => Value::from_safe_string(s),
                    other => Value::from_serialize(&other),
                })
            });
    }
}

/// Registers the framework's filters with a MiniJinja environment.
pub fn register_filters(env: &mut Environment<'static>) {
    env.add_filter("nl", |value: Value| -> String { format!("{}\n", value) });

    // Mirrors the request "cmd" filter so templates can build safe identifiers.
    env.add_filter("cmd", |value: String| -> String {
        value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
            .collect::<String>()
            .trim_start_matches('.')
            .to_string()
    });
}

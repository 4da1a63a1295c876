//! Component views.
//!
//! A [`View`] owns a layout name, a data map, ordered search paths for layout
//! templates and helper files, and the helpers bound to it. Rendering resolves
//! `<layout>[_<tpl>]` across the template search paths and hands the file to
//! the template engine.
//!
//! # Search Paths
//!
//! Paths behave as a stack: [`View::add_path`] pushes to the front, so the
//! directory added last is searched first. For the template kind,
//! [`View::set_path`] produces, in search order:
//!
//! 1. `<theme>/html/<option>/<view name>` for every override root (theme overrides)
//! 2. the given path
//! 3. the given path's parent, when the path ends in the legacy `tmpl` folder
//!
//! # Ambient State
//!
//! The active theme path, the current component path and the request option
//! come from a [`ViewDefaults`] value supplied by the caller rather than from
//! process globals.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RenderError;
use crate::helper::{component_name, Helper, HelperCatalog, TemplateHelper, ViewRef};
use crate::template::{find_template, MiniJinjaEngine, TemplateEngine};

/// Default layout rendered when none is configured.
pub const DEFAULT_LAYOUT: &str = "display";

/// Kind of search path a view maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// Layout templates.
    Template,
    /// Helper template files.
    Helper,
}

/// Read-only snapshot of a view, handed to helpers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewInfo {
    pub name: String,
    pub layout: String,
    pub option: String,
    pub controller: String,
    pub task: String,
    pub base_path: PathBuf,
}

/// Application-supplied defaults for view construction.
#[derive(Debug, Clone, Default)]
pub struct ViewDefaults {
    /// Path of the active theme; the default override root.
    pub theme_path: Option<PathBuf>,
    /// Path of the component currently executing; the default base path.
    pub component_path: Option<PathBuf>,
    /// The request's `option` parameter.
    pub option: String,
    /// Registered helper factories.
    pub helpers: Arc<HelperCatalog>,
}

/// Construction options for a [`View`]. Unset fields fall back to
/// [`ViewDefaults`] or to the conventional layout under the base path.
#[derive(Debug, Clone, Default)]
pub struct ViewConfig {
    pub name: Option<String>,
    pub layout: Option<String>,
    pub base_path: Option<PathBuf>,
    pub override_path: Option<Vec<PathBuf>>,
    pub template_path: Option<PathBuf>,
    pub helper_path: Option<PathBuf>,
}

impl ViewConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    pub fn override_path(mut self, paths: Vec<PathBuf>) -> Self {
        self.override_path = Some(paths);
        self
    }

    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    pub fn helper_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.helper_path = Some(path.into());
        self
    }
}

/// Either a layout name or an already-built view, for [`View::view`].
pub enum Layout {
    Name(String),
    View(Box<View>),
}

impl From<&str> for Layout {
    fn from(name: &str) -> Self {
        Layout::Name(name.to_string())
    }
}

impl From<String> for Layout {
    fn from(name: String) -> Self {
        Layout::Name(name)
    }
}

impl From<View> for Layout {
    fn from(view: View) -> Self {
        Layout::View(Box::new(view))
    }
}

/// A component view.
///
/// ```rust,ignore
/// let mut view = View::new(ViewConfig::new("entries").layout("display"), &defaults);
/// view.set("rows", json!(rows)).set("option", json!("com_blog"));
/// let html = view.display()?;
/// ```
pub struct View {
    name: String,
    layout: String,
    base_path: PathBuf,
    override_paths: Vec<PathBuf>,
    request_option: String,
    paths: HashMap<PathKind, Vec<PathBuf>>,
    data: Map<String, Value>,
    helpers: HashMap<String, Arc<dyn Helper>>,
    catalog: Arc<HelperCatalog>,
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut helpers: Vec<&String> = self.helpers.keys().collect();
        helpers.sort();
        f.debug_struct("View")
            .field("name", &self.name)
            .field("layout", &self.layout)
            .field("base_path", &self.base_path)
            .field("override_paths", &self.override_paths)
            .field("paths", &self.paths)
            .field("helpers", &helpers)
            .finish_non_exhaustive()
    }
}

impl View {
    /// Builds a view, filling unset config from `defaults`.
    pub fn new(config: ViewConfig, defaults: &ViewDefaults) -> Self {
        let override_paths = match config.override_path {
            Some(paths) => paths,
            None => defaults.theme_path.iter().cloned().collect(),
        };
        let base_path = config
            .base_path
            .or_else(|| defaults.component_path.clone())
            .unwrap_or_default();
        let name = config.name.unwrap_or_else(|| "default".to_string());

        let mut view = Self {
            name,
            layout: config.layout.unwrap_or_else(|| DEFAULT_LAYOUT.to_string()),
            base_path,
            override_paths,
            request_option: defaults.option.clone(),
            paths: HashMap::new(),
            data: Map::new(),
            helpers: HashMap::new(),
            catalog: defaults.helpers.clone(),
        };

        let template_path = config
            .template_path
            .unwrap_or_else(|| view.base_path.join("views").join(&view.name).join("tmpl"));
        view.set_path(PathKind::Template, template_path);

        let helper_path = config
            .helper_path
            .unwrap_or_else(|| view.base_path.join("helpers"));
        view.set_path(PathKind::Helper, helper_path);

        view
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    /// Sets the layout, returning the previous one.
    pub fn set_layout(&mut self, layout: impl Into<String>) -> String {
        std::mem::replace(&mut self.layout, layout.into())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn override_paths(&self) -> &[PathBuf] {
        &self.override_paths
    }

    /// Current search paths for `kind`, in search order.
    pub fn paths(&self, kind: PathKind) -> &[PathBuf] {
        self.paths.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replaces the search paths for `kind`.
    pub fn set_path(&mut self, kind: PathKind, path: impl Into<PathBuf>) {
        let path = path.into();
        self.paths.insert(kind, Vec::new());

        if kind == PathKind::Template && path.file_name().is_some_and(|n| n == "tmpl") {
            if let Some(parent) = path.parent() {
                self.add_path(kind, parent.to_path_buf());
            }
        }

        self.add_path(kind, path);

        if kind == PathKind::Template && !self.override_paths.is_empty() {
            let component: String = self
                .request_option
                .to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
                .collect();
            let overrides: Vec<PathBuf> = self
                .override_paths
                .iter()
                .map(|root| root.join("html").join(&component).join(&self.name))
                .collect();
            for dir in overrides {
                self.add_path(kind, dir);
            }
        }
    }

    /// Pushes a search path; it is searched before all existing ones.
    pub fn add_path(&mut self, kind: PathKind, path: impl Into<PathBuf>) {
        self.paths.entry(kind).or_default().insert(0, path.into());
    }

    /// Assigns a template variable.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    fn get_str(&self, key: &str) -> String {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub fn option(&self) -> String {
        self.get_str("option")
    }

    pub fn controller(&self) -> String {
        self.get_str("controller")
    }

    pub fn task(&self) -> String {
        self.get_str("task")
    }

    /// Snapshot handed to helpers.
    pub fn info(&self) -> ViewInfo {
        ViewInfo {
            name: self.name.clone(),
            layout: self.layout.clone(),
            option: self.option(),
            controller: self.controller(),
            task: self.task(),
            base_path: self.base_path.clone(),
        }
    }

    /// Creates a sibling view sharing this view's base and override paths.
    ///
    /// An existing view is returned unchanged.
    pub fn view(&self, layout: impl Into<Layout>, name: Option<&str>) -> View {
        let layout = match layout.into() {
            Layout::View(view) => return *view,
            Layout::Name(layout) => layout,
        };

        let config = ViewConfig {
            name: Some(name.map(str::to_string).unwrap_or_else(|| self.name.clone())),
            layout: Some(layout),
            base_path: Some(self.base_path.clone()),
            override_path: Some(self.override_paths.clone()),
            template_path: None,
            helper_path: None,
        };
        let defaults = ViewDefaults {
            theme_path: None,
            component_path: None,
            option: self.request_option.clone(),
            helpers: self.catalog.clone(),
        };

        let mut view = View::new(config, &defaults);
        view.set("option", Value::String(self.option()))
            .set("controller", Value::String(self.controller()))
            .set("task", Value::String(self.task()));
        view
    }

    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Registers a helper under `name`, binding it to this view.
    pub fn helper(&mut self, name: impl Into<String>, mut helper: Box<dyn Helper>) -> &mut Self {
        helper.set_view(self.view_ref());
        self.helpers.insert(name.into(), Arc::from(helper));
        self
    }

    /// Component whose helpers this view resolves: its `option` variable,
    /// or the request option when unset.
    fn helper_option(&self) -> String {
        match self.option() {
            o if o.is_empty() => self.request_option.clone(),
            o => o,
        }
    }

    fn view_ref(&self) -> ViewRef {
        Arc::new(self.info())
    }

    /// Invokes a helper by name, resolving it on first use.
    ///
    /// Resolution order for an unregistered name: the helper catalog
    /// (namespaced key, then legacy key), then a `<method>` template file on
    /// the helper search path.
    pub fn call(&mut self, method: &str, args: &[Value]) -> Result<Value, RenderError> {
        if !self.has_helper(method) {
            let option = self.helper_option();

            if let Some(helper) = self.catalog.resolve(component_name(&option), method) {
                tracing::debug!(helper = method, option = %option, "resolved view helper from catalog");
                self.helper(method, helper);
            } else if let Some(file) = find_template(self.paths(PathKind::Helper), method) {
                tracing::debug!(helper = method, path = %file.display(), "resolved view helper file");
                self.helper(method, Box::new(TemplateHelper::new(method, file)));
            }
        }

        match self.helpers.get(method) {
            Some(helper) => helper.invoke(args),
            None => Err(RenderError::UnknownHelper(method.to_string())),
        }
    }

    /// Renders the current layout, or `<layout>_<tpl>` when `tpl` is given.
    pub fn load_template(&self, tpl: Option<&str>) -> Result<String, RenderError> {
        let layout = clean_name(&self.layout);
        let file = match tpl.map(clean_name) {
            Some(tpl) if !tpl.is_empty() => format!("{}_{}", layout, tpl),
            _ => layout,
        };

        let dirs = self.paths(PathKind::Template).to_vec();
        let path = find_template(&dirs, &file).ok_or_else(|| RenderError::TemplateNotFound {
            name: file.clone(),
            searched: dirs.clone(),
        })?;
        let source = std::fs::read_to_string(&path)?;

        let mut engine = MiniJinjaEngine::with_search_paths(dirs);
        for (name, helper) in &self.helpers {
            engine.add_helper(name, helper.clone());
        }
        let option = self.helper_option();
        for method in self.catalog.methods_for(&option) {
            if self.helpers.contains_key(method) {
                continue;
            }
            if let Some(mut helper) = self.catalog.resolve(component_name(&option), method) {
                helper.set_view(self.view_ref());
                engine.add_helper(method, Arc::from(helper));
            }
        }

        let mut data = self.data.clone();
        data.insert("view".to_string(), serde_json::to_value(self.info())?);
        let template_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(file);

        tracing::debug!(view = %self.name, template = %path.display(), "rendering layout");
        engine.render_source(&template_name, &source, &Value::Object(data))
    }

    /// Renders the view.
    pub fn display(&self) -> Result<String, RenderError> {
        self.load_template(None)
    }
}

/// Strips characters not allowed in layout names.
fn clean_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect()
}

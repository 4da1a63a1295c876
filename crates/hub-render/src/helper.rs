//! View helpers.
//!
//! A helper is a named callable a view (or its templates) can invoke, e.g.
//! `view.call("truncate", &[json!(text), json!(80)])` or
//! `{{ truncate(text, 80) }}` inside a layout.
//!
//! # The Interface Pair
//!
//! - [`Helper`]: the capability every helper implements. It is bound to the
//!   view that registered it via [`Helper::set_view`] before first use.
//! - [`HelperBase`]: reusable storage for the bound view. Helpers embed it and
//!   forward `set_view`/`view` to it, the way most helpers in the wild do.
//!
//! # Resolution
//!
//! Helpers are not discovered by reflecting on type names. Applications
//! register factories in a [`HelperCatalog`] at startup under the two naming
//! conventions the component tree has always used:
//!
//! | Convention | Key |
//! |------------|-----|
//! | Namespaced | `Components\Blog\Helpers\Truncate` |
//! | Legacy | `BlogHelperTruncate` |
//!
//! [`View::call`](crate::View::call) consults the catalog and then falls back
//! to helper template files found on the view's helper search path.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::error::RenderError;
use crate::template::{MiniJinjaEngine, TemplateEngine};
use crate::view::ViewInfo;

/// Shared, read-only snapshot of the view a helper is bound to.
pub type ViewRef = Arc<ViewInfo>;

/// A view helper.
pub trait Helper: Send + Sync {
    /// Binds the helper to a view.
    fn set_view(&mut self, view: ViewRef);

    /// Returns the bound view, if any.
    fn view(&self) -> Option<&ViewRef>;

    /// Runs the helper with positional arguments.
    fn invoke(&self, args: &[Value]) -> Result<Value, RenderError>;
}

/// Storage for the view a helper is bound to.
///
/// ```rust
/// use hub_render::helper::{Helper, HelperBase, ViewRef};
/// use hub_render::RenderError;
/// use serde_json::{json, Value};
///
/// #[derive(Default)]
/// struct OptionName { base: HelperBase }
///
/// impl Helper for OptionName {
///     fn set_view(&mut self, view: ViewRef) { self.base.set_view(view); }
///     fn view(&self) -> Option<&ViewRef> { self.base.view() }
///     fn invoke(&self, _args: &[Value]) -> Result<Value, RenderError> {
///         Ok(json!(self.view().map(|v| v.option.clone()).unwrap_or_default()))
///     }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct HelperBase {
    view: Option<ViewRef>,
}

impl HelperBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_view(&mut self, view: ViewRef) -> &mut Self {
        self.view = Some(view);
        self
    }

    pub fn view(&self) -> Option<&ViewRef> {
        self.view.as_ref()
    }
}

/// A helper backed by a closure.
pub struct FnHelper<F> {
    base: HelperBase,
    f: F,
}

impl<F> FnHelper<F>
where
    F: Fn(&[Value]) -> Result<Value, RenderError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            base: HelperBase::new(),
            f,
        }
    }
}

impl<F> Helper for FnHelper<F>
where
    F: Fn(&[Value]) -> Result<Value, RenderError> + Send + Sync,
{
    fn set_view(&mut self, view: ViewRef) {
        self.base.set_view(view);
    }

    fn view(&self) -> Option<&ViewRef> {
        self.base.view()
    }

    fn invoke(&self, args: &[Value]) -> Result<Value, RenderError> {
        (self.f)(args)
    }
}

/// A helper implemented as a template file on the helper search path.
///
/// The template sees `args` (the positional arguments) and `view` (the bound
/// view's name, layout, option, controller and task).
pub struct TemplateHelper {
    base: HelperBase,
    name: String,
    path: PathBuf,
}

impl TemplateHelper {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            base: HelperBase::new(),
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Helper for TemplateHelper {
    fn set_view(&mut self, view: ViewRef) {
        self.base.set_view(view);
    }

    fn view(&self) -> Option<&ViewRef> {
        self.base.view()
    }

    fn invoke(&self, args: &[Value]) -> Result<Value, RenderError> {
        let source = std::fs::read_to_string(&self.path)?;
        let search: Vec<PathBuf> = self.path.parent().map(Path::to_path_buf).into_iter().collect();
        let mut engine = MiniJinjaEngine::with_search_paths(search);
        let ctx = serde_json::json!({
            "args": args,
            "view": self.view().map(|v| v.as_ref()),
        });
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone());
        engine
            .render_source(&file_name, &source, &ctx)
            .map(Value::String)
            .map_err(|e| RenderError::helper(&self.name, e))
    }
}

/// Builds a fresh, unbound helper instance.
pub type HelperFactory = Arc<dyn Fn() -> Box<dyn Helper> + Send + Sync>;

/// Startup-populated table of helper factories keyed by class-style name.
#[derive(Clone, Default)]
pub struct HelperCatalog {
    factories: HashMap<String, HelperFactory>,
    methods: HashMap<String, Vec<String>>,
}

impl fmt::Debug for HelperCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.factories.keys().collect();
        keys.sort();
        f.debug_struct("HelperCatalog").field("helpers", &keys).finish()
    }
}

impl HelperCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under an explicit key.
    pub fn register<F>(&mut self, key: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Helper> + Send + Sync + 'static,
    {
        self.factories.insert(key.into(), Arc::new(factory));
        self
    }

    /// Registers a factory under the namespaced convention
    /// `Components\<Component>\Helpers\<Method>`. Helpers registered this
    /// way are also callable by name from the component's templates.
    pub fn register_component<F>(&mut self, option: &str, method: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Helper> + Send + Sync + 'static,
    {
        let methods = self
            .methods
            .entry(component_name(option).to_lowercase())
            .or_default();
        if !methods.iter().any(|m| m == method) {
            methods.push(method.to_string());
        }
        self.register(Self::namespaced_key(option, method), factory)
    }

    /// Methods registered with [`register_component`](Self::register_component)
    /// for `option`.
    pub fn methods_for(&self, option: &str) -> &[String] {
        self.methods
            .get(&component_name(option).to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// `Components\Blog\Helpers\Truncate` for (`com_blog`, `truncate`).
    pub fn namespaced_key(option: &str, method: &str) -> String {
        format!(
            "Components\\{}\\Helpers\\{}",
            ucfirst(component_name(option)),
            ucfirst(method)
        )
    }

    /// `BlogHelperTruncate` for (`com_blog`, `truncate`).
    pub fn legacy_key(option: &str, method: &str) -> String {
        format!(
            "{}Helper{}",
            ucfirst(component_name(option)),
            ucfirst(method)
        )
    }

    /// Instantiates the helper for `method`, trying the namespaced key first.
    pub fn resolve(&self, option: &str, method: &str) -> Option<Box<dyn Helper>> {
        [
            Self::namespaced_key(option, method),
            Self::legacy_key(option, method),
        ]
        .iter()
        .find_map(|key| self.factories.get(key))
        .map(|factory| factory())
    }
}

/// Strips the `com_` prefix from an option.
pub(crate) fn component_name(option: &str) -> &str {
    option.strip_prefix("com_").unwrap_or(option)
}

/// Uppercases the first character, leaving the rest untouched.
pub(crate) fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

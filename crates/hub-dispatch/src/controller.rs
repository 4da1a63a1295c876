//! Site controllers.
//!
//! Components without a bootstrap or entry script are driven by a controller
//! chosen from the request's `controller` parameter. A component can register
//! its own [`Controller`]; otherwise a [`DefaultSiteController`] renders the
//! view named after the controller.
//!
//! # Task Dispatch
//!
//! The request's `task` (lowercased) selects the method `<task>Task`. Methods
//! are looked up in an explicit task table:
//!
//! | Method | Outcome |
//! |--------|---------|
//! | registered | the task function runs |
//! | unregistered, ends in `Task` | the view is displayed |
//! | anything else | [`DispatchError::UndefinedMethod`] |

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use hub_render::View;

use crate::context::DispatchContext;
use crate::error::DispatchError;

/// Construction parameters for a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Component name without the `com_` prefix.
    pub component: String,
    /// Controller name from the request.
    pub name: String,
    /// The component's client directory.
    pub base_path: PathBuf,
}

/// A controller runs one request against a component.
pub trait Controller {
    fn execute(&mut self, ctx: &mut DispatchContext<'_>) -> Result<(), DispatchError>;
}

pub type ControllerFactory = Arc<dyn Fn(ControllerConfig) -> Box<dyn Controller> + Send + Sync>;

/// A task body. Receives the controller's view, prepared with the request's
/// option, controller and task.
pub type TaskFn =
    Arc<dyn Fn(&mut View, &mut DispatchContext<'_>) -> Result<(), DispatchError> + Send + Sync>;

/// Controller synthesized for components that ship none.
#[derive(Clone)]
pub struct DefaultSiteController {
    config: ControllerConfig,
    tasks: HashMap<String, TaskFn>,
    task: String,
}

impl fmt::Debug for DefaultSiteController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tasks: Vec<&String> = self.tasks.keys().collect();
        tasks.sort();
        f.debug_struct("DefaultSiteController")
            .field("config", &self.config)
            .field("tasks", &tasks)
            .field("task", &self.task)
            .finish()
    }
}

impl DefaultSiteController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            tasks: HashMap::new(),
            task: String::new(),
        }
    }

    /// Registers the body of task `name`.
    pub fn task<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&mut View, &mut DispatchContext<'_>) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.tasks.insert(method_name(name), Arc::new(f));
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// The task selected by the last [`execute`](Controller::execute).
    pub fn current_task(&self) -> &str {
        &self.task
    }

    /// Invokes `method` through the task table.
    pub fn call(&self, method: &str, ctx: &mut DispatchContext<'_>) -> Result<(), DispatchError> {
        if let Some(task) = self.tasks.get(&method.to_lowercase()) {
            let mut view = self.view(ctx);
            return task(&mut view, ctx);
        }

        if ends_with_task(method) {
            tracing::debug!(controller = %self.config.name, method, "no task body; displaying view");
            return self.display(ctx);
        }

        Err(DispatchError::UndefinedMethod {
            controller: self.class_name(),
            method: method.to_string(),
        })
    }

    /// Renders the controller's view into the output buffer.
    pub fn display(&self, ctx: &mut DispatchContext<'_>) -> Result<(), DispatchError> {
        let view = self.view(ctx);
        let html = view.display()?;
        ctx.echo(html);
        Ok(())
    }

    fn view(&self, ctx: &DispatchContext<'_>) -> View {
        ctx.view(&self.config.name, &self.config.name, &self.task)
    }

    fn class_name(&self) -> String {
        format!(
            "Components\\{}\\Site\\Controllers\\{}",
            crate::canonical::ucfirst(&self.config.component),
            crate::canonical::ucfirst(&self.config.name)
        )
    }
}

impl Controller for DefaultSiteController {
    fn execute(&mut self, ctx: &mut DispatchContext<'_>) -> Result<(), DispatchError> {
        self.task = ctx.request.get_cmd("task", "").to_lowercase();
        let method = format!("{}Task", self.task);
        tracing::debug!(controller = %self.config.name, task = %self.task, "executing task");
        self.call(&method, ctx)
    }
}

fn method_name(task: &str) -> String {
    format!("{}task", task.to_lowercase())
}

fn ends_with_task(method: &str) -> bool {
    method.len() >= 4
        && method
            .get(method.len() - 4..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case("task"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use hub_render::{Document, ViewDefaults};
    use std::fs;
    use std::path::Path;

    fn config(base: &Path) -> ControllerConfig {
        ControllerConfig {
            component: "blog".into(),
            name: "entries".into(),
            base_path: base.to_path_buf(),
        }
    }

    fn with_ctx<R>(base: &Path, request: &Request, f: impl FnOnce(&mut DispatchContext<'_>) -> R) -> (R, String) {
        let mut doc = Document::new();
        let defaults = ViewDefaults {
            option: "com_blog".into(),
            ..ViewDefaults::default()
        };
        let mut ctx = DispatchContext::new("com_blog", "site", base, request, &mut doc, defaults);
        let r = f(&mut ctx);
        (r, ctx.into_output())
    }

    fn layout(dir: &Path, body: &str) {
        let tmpl = dir.join("views/entries/tmpl");
        fs::create_dir_all(&tmpl).unwrap();
        fs::write(tmpl.join("display.jinja"), body).unwrap();
    }

    #[test]
    fn test_ends_with_task() {
        assert!(ends_with_task("displayTask"));
        assert!(ends_with_task("Task"));
        assert!(ends_with_task("editTASK"));
        assert!(!ends_with_task("display"));
        assert!(!ends_with_task("ask"));
        assert!(!ends_with_task("ééé"));
    }

    #[test]
    fn test_unknown_task_displays_view() {
        let dir = tempfile::tempdir().unwrap();
        layout(dir.path(), "{{ option }}:{{ controller }}:{{ task }}");
        let request = Request::new().with("task", "Archive");

        let mut controller = DefaultSiteController::new(config(dir.path()));
        let (result, out) = with_ctx(dir.path(), &request, |ctx| controller.execute(ctx));
        result.unwrap();
        assert_eq!(out, "com_blog:entries:archive");
        assert_eq!(controller.current_task(), "archive");
    }

    #[test]
    fn test_empty_task_displays_view() {
        let dir = tempfile::tempdir().unwrap();
        layout(dir.path(), "listing");
        let mut controller = DefaultSiteController::new(config(dir.path()));
        let (result, out) = with_ctx(dir.path(), &Request::new(), |ctx| controller.execute(ctx));
        result.unwrap();
        assert_eq!(out, "listing");
    }

    #[test]
    fn test_registered_task_runs() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::new().with("task", "SAVE").with("id", "7");
        let mut controller = DefaultSiteController::new(config(dir.path())).task("save", |view, ctx| {
            let id = ctx.request.get("id").unwrap_or_default().to_string();
            ctx.echo(format!("saved {} in {}", id, view.name()));
            Ok(())
        });
        let (result, out) = with_ctx(dir.path(), &request, |ctx| controller.execute(ctx));
        result.unwrap();
        assert_eq!(out, "saved 7 in entries");
    }

    #[test]
    fn test_undefined_method_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let controller = DefaultSiteController::new(config(dir.path()));
        let (result, _) = with_ctx(dir.path(), &Request::new(), |ctx| controller.call("frobnicate", ctx));
        match result {
            Err(DispatchError::UndefinedMethod { controller, method }) => {
                assert_eq!(controller, "Components\\Blog\\Site\\Controllers\\Entries");
                assert_eq!(method, "frobnicate");
            }
            other => panic!("expected UndefinedMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_display_without_layout_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = DefaultSiteController::new(config(dir.path()));
        let (result, _) = with_ctx(dir.path(), &Request::new(), |ctx| controller.execute(ctx));
        assert!(matches!(result, Err(DispatchError::Render(_))));
    }
}

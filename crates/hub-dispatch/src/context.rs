//! Per-dispatch state handed to bootstraps and controllers.

use std::path::Path;

use hub_render::{Document, View, ViewConfig, ViewDefaults};

use crate::request::Request;

/// Everything an entry point may touch while it runs.
///
/// Output written with [`echo`](Self::echo) is buffered and becomes the
/// result of the dispatch.
pub struct DispatchContext<'a> {
    pub option: &'a str,
    pub client: &'a str,
    pub component_path: &'a Path,
    pub request: &'a Request,
    pub document: &'a mut Document,
    pub view_defaults: ViewDefaults,
    output: String,
}

impl<'a> DispatchContext<'a> {
    pub fn new(
        option: &'a str,
        client: &'a str,
        component_path: &'a Path,
        request: &'a Request,
        document: &'a mut Document,
        view_defaults: ViewDefaults,
    ) -> Self {
        Self {
            option,
            client,
            component_path,
            request,
            document,
            view_defaults,
            output: String::new(),
        }
    }

    /// Appends to the output buffer.
    pub fn echo(&mut self, text: impl AsRef<str>) {
        self.output.push_str(text.as_ref());
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }

    /// A view of this component named `name`, carrying the request's
    /// option, controller and task.
    pub fn view(&self, name: &str, controller: &str, task: &str) -> View {
        let config = ViewConfig::new(name).base_path(self.component_path);
        let mut view = View::new(config, &self.view_defaults);
        view.set("option", self.option.into())
            .set("controller", controller.into())
            .set("task", task.into());
        view
    }
}

impl std::fmt::Debug for DispatchContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext")
            .field("option", &self.option)
            .field("client", &self.client)
            .field("component_path", &self.component_path)
            .field("output_len", &self.output.len())
            .finish_non_exhaustive()
    }
}

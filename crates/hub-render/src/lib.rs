//! # Hub Render - Component Views and Page Head State
//!
//! `hub-render` provides the view layer components use to produce markup:
//! layout lookup across ordered search paths (with theme overrides), a
//! MiniJinja-backed template engine, named view helpers, and the [`Document`]
//! that collects head metadata for the surrounding page.
//!
//! ## Core Concepts
//!
//! - [`View`]: layout name, data, template/helper search paths and helpers
//! - [`ViewConfig`] / [`ViewDefaults`]: explicit construction options plus the
//!   application-supplied ambient state (active theme, current component)
//! - [`Helper`] / [`HelperBase`]: the view helper interface pair
//! - [`HelperCatalog`]: startup-registered helper factories
//! - [`Document`]: charset, title, metadata, stylesheets, scripts, head links
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hub_render::{View, ViewConfig, ViewDefaults};
//! use serde_json::json;
//!
//! let defaults = ViewDefaults {
//!     component_path: Some("/var/www/app/components/com_blog/site".into()),
//!     option: "com_blog".into(),
//!     ..ViewDefaults::default()
//! };
//!
//! let mut view = View::new(ViewConfig::new("entries"), &defaults);
//! view.set("title", json!("Latest entries"));
//! let html = view.display().unwrap();
//! println!("{}", html);
//! ```
//!
//! ## Layout Files
//!
//! A view named `entries` with layout `display` looks for `display.jinja`,
//! `display.jinja2`, `display.j2` and `display.html` in, in order:
//!
//! 1. `<theme>/html/com_blog/entries/` (theme override)
//! 2. `<component>/views/entries/tmpl/`
//! 3. `<component>/views/entries/`

pub mod document;
mod error;
pub mod helper;
pub mod prelude;
pub mod template;
pub mod view;

pub use document::{Document, HeadLink, MetaEntry, Script, Stylesheet};
pub use error::RenderError;
pub use helper::{FnHelper, Helper, HelperBase, HelperCatalog, HelperFactory, TemplateHelper, ViewRef};
pub use template::{MiniJinjaEngine, TemplateEngine, TEMPLATE_EXTENSIONS};
pub use view::{Layout, PathKind, View, ViewConfig, ViewDefaults, ViewInfo, DEFAULT_LAYOUT};

//! Layout lookup and template rendering.
//!
//! Layout files are located by [`search`] across an ordered list of
//! directories and rendered by a [`TemplateEngine`], MiniJinja by default.

pub mod engine;
pub mod search;

pub use engine::{register_filters, MiniJinjaEngine, TemplateEngine};
pub use search::{find_file, find_template, TEMPLATE_EXTENSIONS};
